use std::fmt;

use serde::{Deserialize, Serialize};

use crate::status::strings;

/// Fields read from a detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogicalField {
    ProductName,
    EnterpriseName,
    RegistrationNumber,
    ApprovalDate,
    ValidUntil,
}

impl LogicalField {
    pub const ALL: [LogicalField; 5] = [
        LogicalField::ProductName,
        LogicalField::EnterpriseName,
        LogicalField::RegistrationNumber,
        LogicalField::ApprovalDate,
        LogicalField::ValidUntil,
    ];
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalField::ProductName => "productName",
            LogicalField::EnterpriseName => "enterpriseName",
            LogicalField::RegistrationNumber => "registrationNumber",
            LogicalField::ApprovalDate => "approvalDate",
            LogicalField::ValidUntil => "validUntil",
        };
        f.write_str(name)
    }
}

/// Prioritized label synonyms, most specific first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSynonyms {
    pub product_name: Vec<String>,
    pub enterprise_name: Vec<String>,
    pub registration_number: Vec<String>,
    pub approval_date: Vec<String>,
    pub valid_until: Vec<String>,
    /// Labels of the row that links to the product's executed standard.
    pub standard: Vec<String>,
}

impl Default for FieldSynonyms {
    fn default() -> Self {
        Self {
            product_name: strings(&["产品名称中文", "产品中文名称", "产品名称", "中文名称"]),
            enterprise_name: strings(&[
                "注册人中文名称",
                "注册人名称",
                "备案人名称",
                "生产企业名称",
                "企业名称",
                "注册人",
                "备案人",
            ]),
            registration_number: strings(&[
                "注册证号",
                "注册证编号",
                "批准文号",
                "备案编号",
                "备案号",
            ]),
            approval_date: strings(&["批件批准日期", "批准日期", "备案日期"]),
            valid_until: strings(&["批件有效期", "有效期至", "有效期截止日", "有效期"]),
            standard: strings(&["产品执行的标准", "产品技术要求", "技术要求", "执行标准"]),
        }
    }
}

impl FieldSynonyms {
    pub fn for_field(&self, field: LogicalField) -> &[String] {
        match field {
            LogicalField::ProductName => &self.product_name,
            LogicalField::EnterpriseName => &self.enterprise_name,
            LogicalField::RegistrationNumber => &self.registration_number,
            LogicalField::ApprovalDate => &self.approval_date,
            LogicalField::ValidUntil => &self.valid_until,
        }
    }

    /// Labels whose presence means a detail view has rendered.
    pub fn readiness_labels(&self) -> impl Iterator<Item = &str> {
        self.product_name
            .iter()
            .chain(self.standard.iter())
            .map(String::as_str)
    }
}
