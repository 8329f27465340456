use serde::Serialize;
use tabled::Tabled;

/// Canonical column names of the DROP OFF spreadsheet.
pub mod columns {
    pub const REGION: &str = "UF 州";
    pub const CITY: &str = "Cidade 城市";
    pub const STATUS: &str = "Status 状态";
    pub const RESPONSIBLE: &str = "Responsável que prospectou 负责人";
    pub const CONSOLIDATOR_BASE: &str = "Base Consolidadora 覆盖网点";

    /// Column order of the detail table. Columns missing from a file are skipped.
    pub const DETAIL_ORDER: [&str; 28] = [
        "Razão social 公司名称",
        REGION,
        CITY,
        CONSOLIDATOR_BASE,
        STATUS,
        RESPONSIBLE,
        "Indicação 推荐人",
        "PROPRIETARIO(A) 房东",
        "CNPJ",
        "DADOS BANCÁRIOS 银行信息",
        "PIX CNPJ = conta",
        "E-MAIL 电子邮件",
        "ENDEREÇO 地址",
        "CEL 电话号码",
        "Localização 地图位置",
        "CNAE 服务编号",
        "Documentos enviados",
        "contrato assinado",
        "HORÁRIO DE FUNCIONAMENTO 营业时间",
        "Login  YoYi YoYi注册",
        "PIN site oficial 官网地图标记",
        "Cadastro TOTVS TOTVS注册",
        "Cadastro JMS JMS注册",
        "Treinamento 培训",
        "Documentos Necessários Para Finalização Cadastro YoYi (Foto CPF/RG, Alvará de Funcionamento, Foto da Visão EXTERNA do estabelecimento)",
        "FOTO EXTERNA DA LOJA",
        "Data de encaminhamento para assinatura de contrato",
        "Data da assinatura do contrato 签合同日期",
    ];
}

/// Status values counted by the summary metrics.
pub const STATUS_ACTIVE: &str = "Funcionando/Ativo 已开始营业";
pub const STATUS_NEGOTIATING: &str = "Em negociação 谈判当中";

/// Marker used in file names and prompts when no region is selected.
pub const ALL_REGIONS: &str = "Todos";

/// A loaded table. Every cell is kept as text; rows are padded to the header width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// A view over every row, in file order.
    pub fn view(&self) -> DatasetView<'_> {
        DatasetView {
            dataset: self,
            rows: (0..self.rows.len()).collect(),
        }
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// A subset of a dataset's rows, referenced by index.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    dataset: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> DatasetView<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [String]> + '_ {
        let dataset = self.dataset;
        self.rows.iter().map(move |&i| dataset.rows[i].as_slice())
    }

    /// Values of one column for the rows in the view, or `None` if the column is absent.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &'a str> + '_> {
        let idx = self.dataset.column_index(name)?;
        Some(self.rows().map(move |row| cell(row, idx)))
    }

    /// Keep only rows whose value in `column` satisfies `keep`.
    /// Returns `None` (and leaves the view alone) when the column is absent.
    pub fn retain_by<F>(&mut self, column: &str, keep: F) -> Option<()>
    where
        F: Fn(&str) -> bool,
    {
        let idx = self.dataset.column_index(column)?;
        let dataset = self.dataset;
        self.rows.retain(|&i| keep(cell(&dataset.rows[i], idx)));
        Some(())
    }
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MetricsRow {
    #[serde(rename = "TotalBases")]
    #[tabled(rename = "Total de Bases")]
    pub total: usize,
    #[serde(rename = "Active")]
    #[tabled(rename = "Funcionando/Ativo")]
    pub active: usize,
    #[serde(rename = "Negotiating")]
    #[tabled(rename = "Em negociação")]
    pub negotiating: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct StatusCount {
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "Quantidade")]
    #[tabled(rename = "Quantidade")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct RegionCount {
    #[serde(rename = "UF")]
    #[tabled(rename = "UF")]
    pub code: String,
    #[serde(rename = "Estado")]
    #[tabled(rename = "Estado")]
    pub name: String,
    #[serde(rename = "Quantidade")]
    #[tabled(rename = "Quantidade")]
    pub count: usize,
}
