//! Data models for scraped news and municipal indicator reports.
//!
//! - [`Article`] and [`Category`]: one extracted news story
//! - [`Municipality`]: the fixed set of municipalities every report covers
//! - [`SocialRecord`], [`SpendingRecord`]: one ranked row per municipality
//! - [`Report`]: the envelope ranking reports are written in
//! - [`TransparencyReport`]: the Monte Santo comparison
//!
//! Field names are Portuguese where the JSON consumers expect them, hence
//! `municipio`, `populacao` and friends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Editorial category assigned to an [`Article`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Startups")]
    Startups,
    #[serde(rename = "Pequenas Empresas")]
    SmallBusiness,
    #[serde(rename = "Grandes Empresas")]
    LargeBusiness,
    #[serde(rename = "Investimentos")]
    Investments,
    #[default]
    #[serde(rename = "Empreendedorismo")]
    Entrepreneurship,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Startups => "Startups",
            Category::SmallBusiness => "Pequenas Empresas",
            Category::LargeBusiness => "Grandes Empresas",
            Category::Investments => "Investimentos",
            Category::Entrepreneurship => "Empreendedorismo",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A news article extracted from a single page.
///
/// Only built by the scraper once the title is non-empty and the body holds
/// at least 200 characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Main body text, paragraphs separated by blank lines.
    pub content: String,
    pub author: String,
    /// Publication date as found on the page, or the scrape time.
    pub date: String,
    pub url: String,
    pub category: Category,
    /// Title-cased keywords found in the page, sorted, no duplicates.
    pub tags: Vec<String>,
    pub summary: String,
    /// RFC 3339 timestamp of extraction.
    pub scraped_at: String,
}

/// The municipalities covered by every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Municipality {
    MonteSanto,
    Cansancao,
    Uaua,
    Quijingue,
    EuclidesDaCunha,
    SenhorDoBonfim,
}

impl Municipality {
    /// All municipalities in reporting order.
    pub const ALL: [Municipality; 6] = [
        Municipality::MonteSanto,
        Municipality::Cansancao,
        Municipality::Uaua,
        Municipality::Quijingue,
        Municipality::EuclidesDaCunha,
        Municipality::SenhorDoBonfim,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Municipality::MonteSanto => "Monte Santo",
            Municipality::Cansancao => "Cansanção",
            Municipality::Uaua => "Uauá",
            Municipality::Quijingue => "Quijingue",
            Municipality::EuclidesDaCunha => "Euclides da Cunha",
            Municipality::SenhorDoBonfim => "Senhor do Bonfim",
        }
    }

    /// Seven-digit IBGE municipality code.
    pub fn ibge_code(self) -> &'static str {
        match self {
            Municipality::MonteSanto => "2921400",
            Municipality::Cansancao => "2906107",
            Municipality::Uaua => "2932401",
            Municipality::Quijingue => "2925807",
            Municipality::EuclidesDaCunha => "2910702",
            Municipality::SenhorDoBonfim => "2930108",
        }
    }
}

impl fmt::Display for Municipality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rank label attached to a municipality after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankStatus {
    Excellent,
    Good,
    Warning,
    Alert,
}

impl RankStatus {
    /// Hex colour used by the dashboard for this rank.
    pub fn color(self) -> &'static str {
        match self {
            RankStatus::Excellent => "#059669",
            RankStatus::Good => "#0891b2",
            RankStatus::Warning => "#d97706",
            RankStatus::Alert => "#dc2626",
        }
    }
}

/// Social indicators for one municipality, ranked by GDP per capita.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialRecord {
    pub municipio: String,
    pub codigo: String,
    pub populacao: u64,
    pub pib_per_capita: u64,
    pub idhm: f64,
    pub area_km2: f64,
    pub densidade_dem: f64,
    pub fonte: String,
    pub status: RankStatus,
    pub rank_color: String,
}

/// Health and education spending for one municipality, ranked by total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingRecord {
    pub municipio: String,
    pub codigo: String,
    pub saude: f64,
    pub educacao: f64,
    pub total: f64,
    pub status: RankStatus,
    pub rank_color: String,
}

/// Envelope for a ranked report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub source: String,
    pub year: i32,
}

/// One line of the transparency comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparencyMetric {
    pub metric: String,
    pub value_monte_santo: String,
    pub comparison_text: String,
    pub status: RankStatus,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub generated_at: String,
    pub municipalities_count: usize,
    pub data_sources: Vec<String>,
}

/// Every indicator gathered for one municipality while building the
/// transparency comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalIndicators {
    pub municipio: String,
    pub codigo: String,
    /// `None` when the API answered without a projection.
    pub populacao: Option<u64>,
    pub ano_populacao: Option<i32>,
    pub pib: f64,
    pub pib_per_capita: f64,
    pub idh: f64,
    pub gini: f64,
    pub orcamento_total: u64,
    pub receita_propria: u64,
    pub transferencias_federais: u64,
    pub transferencias_estaduais: u64,
    pub gastos_saude: u64,
    pub gastos_educacao: u64,
    pub transparencia_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparencyReport {
    pub success: bool,
    pub data: Vec<TransparencyMetric>,
    pub municipios: Vec<MunicipalIndicators>,
    pub metadata: ReportMetadata,
}
