use regex::Regex;

use crate::error::{CotejoError, Result};
use crate::models::HeaderStrategy;
use crate::text::normalize_label;

// ---------------------------------------------------------------------------
// Canonical field names
// ---------------------------------------------------------------------------

pub const FECHA: &str = "Fecha";
pub const DESCRIPCION: &str = "Descripción";
pub const NUMERO_DOCUMENTO: &str = "Número de documento";
pub const ASUNTO: &str = "Asunto";
pub const DEPENDENCIA: &str = "Dependencia";
pub const DEBITO: &str = "Débito";
pub const CREDITO: &str = "Crédito";
pub const CONCEPTO: &str = "Concepto";
pub const SALDO: &str = "Saldo";
pub const REFERENCIA: &str = "Referencia";
pub const DESTINO: &str = "Destino";

// ---------------------------------------------------------------------------
// BROU
// ---------------------------------------------------------------------------

const BROU_SCHEMA: &[&str] = &[
    FECHA,
    DESCRIPCION,
    NUMERO_DOCUMENTO,
    ASUNTO,
    DEPENDENCIA,
    DEBITO,
    CREDITO,
];

// Keys are already in normalized form (accent-free, lowercase, single-spaced).
const BROU_SYNONYMS: &[(&str, &str)] = &[
    ("fecha", FECHA),
    ("fecha valor", FECHA),
    ("descripcion", DESCRIPCION),
    ("numero de documento", NUMERO_DOCUMENTO),
    ("nro de documento", NUMERO_DOCUMENTO),
    ("nº de documento", NUMERO_DOCUMENTO),
    ("n° de documento", NUMERO_DOCUMENTO),
    ("nro documento", NUMERO_DOCUMENTO),
    ("no. de documento", NUMERO_DOCUMENTO),
    ("asunto", ASUNTO),
    ("dependencia", DEPENDENCIA),
    ("debito", DEBITO),
    ("debitos", DEBITO),
    ("credito", CREDITO),
    ("creditos", CREDITO),
];

const BROU_PATTERNS: &[(&str, &str)] = &[
    (r"^fecha($| )", FECHA),
    (r"^fecha .*", FECHA),
    (r"^descripcion", DESCRIPCION),
    (r"^(numero|nro|n[º°]|no\.?) de documento|^nro\.? documento", NUMERO_DOCUMENTO),
    (r"^asunto", ASUNTO),
    (r"^dependencia", DEPENDENCIA),
    (r"^deb(ito|itos)?(\b| )", DEBITO),
    (r"^cred(ito|itos)?(\b| )", CREDITO),
];

const BROU_FOOTER: &[&str] = &["saldo anterior", "saldo actual", "total ", "total:"];

// ---------------------------------------------------------------------------
// Itaú
// ---------------------------------------------------------------------------

const ITAU_SCHEMA: &[&str] = &[FECHA, CONCEPTO, DEBITO, CREDITO, SALDO, REFERENCIA, DESTINO];

const ITAU_SYNONYMS: &[(&str, &str)] = &[
    ("fecha", FECHA),
    ("fecha valor", FECHA),
    ("fecha operacion", FECHA),
    ("concepto", CONCEPTO),
    ("descripcion", CONCEPTO),
    ("debito", DEBITO),
    ("debitos", DEBITO),
    ("credito", CREDITO),
    ("creditos", CREDITO),
    ("saldo", SALDO),
    ("referencia", REFERENCIA),
    ("destino", DESTINO),
];

// Declaration order matters: a column is claimed by the first pattern it matches.
const ITAU_PATTERNS: &[(&str, &str)] = &[
    (r"^fecha($| )", FECHA),
    (r"^fecha .*", FECHA),
    (r"concepto|descripcion", CONCEPTO),
    (r"^deb(ito|itos)?(\b| )", DEBITO),
    (r"^cred(ito|itos)?(\b| )", CREDITO),
    (r"^saldo(\b| )", SALDO),
    (r"referencia|nro .*ref|nro\.? referencia", REFERENCIA),
    (r"destino|observaciones|detalle", DESTINO),
];

const ITAU_FOOTER: &[&str] = &[
    "saldo anterior",
    "saldo actual",
    "total ",
    "total:",
    "cantidad de movimientos",
];

// ---------------------------------------------------------------------------
// Bank formats: enum dispatch over static tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankFormat {
    Brou,
    Itau,
}

pub const ALL_FORMATS: &[BankFormat] = &[BankFormat::Brou, BankFormat::Itau];

impl BankFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Brou => "brou",
            Self::Itau => "itau",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Brou => "BROU",
            Self::Itau => "Itaú",
        }
    }

    pub fn profile(&self) -> Result<FormatProfile> {
        match self {
            Self::Brou => FormatProfile::build(
                BROU_SCHEMA,
                BROU_SYNONYMS,
                BROU_PATTERNS,
                &[HeaderStrategy::Dictionary, HeaderStrategy::Fusion],
                &[DEBITO, CREDITO],
                &[DESCRIPCION, NUMERO_DOCUMENTO, ASUNTO],
                BROU_FOOTER,
                None,
            ),
            Self::Itau => FormatProfile::build(
                ITAU_SCHEMA,
                ITAU_SYNONYMS,
                ITAU_PATTERNS,
                &[HeaderStrategy::Anchor, HeaderStrategy::Dictionary, HeaderStrategy::Fusion],
                &[DEBITO, CREDITO, SALDO],
                &[CONCEPTO, REFERENCIA, DESTINO],
                ITAU_FOOTER,
                Some(30),
            ),
        }
    }
}

/// Accepts the key (`itau`) or the display name, case and accents ignored.
pub fn get_by_key(key: &str) -> Option<BankFormat> {
    let wanted = normalize_label(key);
    ALL_FORMATS
        .iter()
        .find(|f| f.key() == wanted || normalize_label(f.name()) == wanted)
        .copied()
}

pub fn parse_format(key: &str) -> Result<BankFormat> {
    get_by_key(key).ok_or_else(|| CotejoError::UnknownFormat(key.to_string()))
}

/// Per-format configuration driving header location, mapping and row building.
#[derive(Debug, Clone)]
pub struct FormatProfile {
    pub schema: &'static [&'static str],
    pub synonyms: &'static [(&'static str, &'static str)],
    pub patterns: Vec<(Regex, &'static str)>,
    pub strategies: &'static [HeaderStrategy],
    /// Amount-bearing fields: parsed with the amount normalizer, required by header acceptance.
    pub amount_fields: &'static [&'static str],
    pub descriptive_fields: &'static [&'static str],
    pub footer_hints: &'static [&'static str],
    /// Only the first `n` rows are scanned for a header when set.
    pub scan_rows: Option<usize>,
}

impl FormatProfile {
    #[allow(clippy::too_many_arguments)]
    fn build(
        schema: &'static [&'static str],
        synonyms: &'static [(&'static str, &'static str)],
        patterns: &[(&str, &'static str)],
        strategies: &'static [HeaderStrategy],
        amount_fields: &'static [&'static str],
        descriptive_fields: &'static [&'static str],
        footer_hints: &'static [&'static str],
        scan_rows: Option<usize>,
    ) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|(p, field)| {
                Regex::new(p)
                    .map(|re| (re, *field))
                    .map_err(|e| CotejoError::Settings(format!("invalid header pattern {p}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema,
            synonyms,
            patterns,
            strategies,
            amount_fields,
            descriptive_fields,
            footer_hints,
            scan_rows,
        })
    }

    pub fn lookup_synonym(&self, normalized: &str) -> Option<&'static str> {
        self.synonyms
            .iter()
            .find(|(k, _)| *k == normalized)
            .map(|(_, field)| *field)
    }

    /// Field of the first pattern the normalized label matches.
    pub fn match_pattern(&self, normalized: &str) -> Option<&'static str> {
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(normalized))
            .map(|(_, field)| *field)
    }

    pub fn is_amount_field(&self, field: &str) -> bool {
        self.amount_fields.contains(&field)
    }

    pub fn columns(&self) -> Vec<String> {
        self.schema.iter().map(|s| s.to_string()).collect()
    }
}
