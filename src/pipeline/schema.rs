// ABOUTME: Extraction schemas for the supported document types
// ABOUTME: Field and table specs plus format validators for dates, currency, numbers

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Receipt,
    Contract,
    General,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Receipt => "receipt",
            DocumentType::Contract => "contract",
            DocumentType::General => "general",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "invoice" => DocumentType::Invoice,
            "receipt" => DocumentType::Receipt,
            "contract" => DocumentType::Contract,
            _ => DocumentType::General,
        }
    }

    /// Classify a document from its text, first keyword match wins.
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("invoice") {
            DocumentType::Invoice
        } else if lower.contains("receipt") {
            DocumentType::Receipt
        } else if lower.contains("contract") || lower.contains("agreement") {
            DocumentType::Contract
        } else {
            DocumentType::General
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Currency,
    Number,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub required: bool,
    pub columns: &'static [ColumnSpec],
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
    }
}

const INVOICE_FIELDS: &[FieldSpec] = &[
    field("invoice_number", FieldKind::Text, true),
    field("date", FieldKind::Date, true),
    field("due_date", FieldKind::Date, false),
    field("total_amount", FieldKind::Currency, true),
    field("tax_amount", FieldKind::Currency, false),
    field("vendor_name", FieldKind::Text, true),
    field("vendor_address", FieldKind::Text, false),
    field("customer_name", FieldKind::Text, true),
    field("customer_address", FieldKind::Text, false),
];

const RECEIPT_FIELDS: &[FieldSpec] = &[
    field("receipt_number", FieldKind::Text, false),
    field("date", FieldKind::Date, true),
    field("total_amount", FieldKind::Currency, true),
    field("tax_amount", FieldKind::Currency, false),
    field("merchant_name", FieldKind::Text, true),
    field("merchant_address", FieldKind::Text, false),
    field("payment_method", FieldKind::Text, false),
];

const CONTRACT_FIELDS: &[FieldSpec] = &[
    field("contract_number", FieldKind::Text, false),
    field("date", FieldKind::Date, true),
    field("effective_date", FieldKind::Date, false),
    field("expiration_date", FieldKind::Date, false),
    field("party_1", FieldKind::Text, true),
    field("party_2", FieldKind::Text, true),
    field("contract_type", FieldKind::Text, false),
    field("contract_value", FieldKind::Currency, false),
];

const GENERAL_FIELDS: &[FieldSpec] = &[
    field("title", FieldKind::Text, false),
    field("date", FieldKind::Date, false),
    field("author", FieldKind::Text, false),
];

const INVOICE_TABLES: &[TableSpec] = &[TableSpec {
    name: "line_items",
    required: true,
    columns: &[
        ColumnSpec {
            name: "description",
            kind: FieldKind::Text,
        },
        ColumnSpec {
            name: "quantity",
            kind: FieldKind::Number,
        },
        ColumnSpec {
            name: "unit_price",
            kind: FieldKind::Currency,
        },
        ColumnSpec {
            name: "total",
            kind: FieldKind::Currency,
        },
    ],
}];

const RECEIPT_TABLES: &[TableSpec] = &[TableSpec {
    name: "items",
    required: true,
    columns: &[
        ColumnSpec {
            name: "description",
            kind: FieldKind::Text,
        },
        ColumnSpec {
            name: "quantity",
            kind: FieldKind::Number,
        },
        ColumnSpec {
            name: "price",
            kind: FieldKind::Currency,
        },
    ],
}];

/// Fields expected for a document type, used by extraction and validation.
pub fn fields_for(document_type: DocumentType) -> &'static [FieldSpec] {
    match document_type {
        DocumentType::Invoice => INVOICE_FIELDS,
        DocumentType::Receipt => RECEIPT_FIELDS,
        DocumentType::Contract => CONTRACT_FIELDS,
        DocumentType::General => GENERAL_FIELDS,
    }
}

/// Tables expected for a document type. General documents carry none.
pub fn tables_for(document_type: DocumentType) -> &'static [TableSpec] {
    match document_type {
        DocumentType::Invoice => INVOICE_TABLES,
        DocumentType::Receipt => RECEIPT_TABLES,
        DocumentType::Contract | DocumentType::General => &[],
    }
}

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{2}-\d{2}-\d{4}|\d{2}\.\d{2}\.\d{4})$")
        .expect("date regex")
});

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([$€£]\d+(\.\d{2})?|\d+(\.\d{2})?(\s*(USD|EUR|GBP))?)$").expect("currency regex")
});

pub fn is_valid_date(value: &str) -> bool {
    DATE_RE.is_match(value)
}

pub fn is_valid_currency(value: &str) -> bool {
    CURRENCY_RE.is_match(value)
}

pub fn is_valid_number(value: &str) -> bool {
    value.replace(',', "").trim().parse::<f64>().is_ok()
}

/// Check one value against its declared kind. Text always passes.
pub fn matches_kind(kind: FieldKind, value: &str) -> bool {
    match kind {
        FieldKind::Text => true,
        FieldKind::Date => is_valid_date(value),
        FieldKind::Currency => is_valid_currency(value),
        FieldKind::Number => is_valid_number(value),
    }
}
