//! Summary figures and keyword counts over a scraped table.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::NOT_INFORMED;
use crate::table::{JobRow, JobTable};

pub const DEFAULT_TOP_TERMS: usize = 30;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}+").unwrap());

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    const PORTUGUESE: &[&str] = &[
        "a", "à", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "às",
        "até", "com", "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois",
        "do", "dos", "e", "é", "ela", "elas", "ele", "eles", "em", "entre", "era", "essa",
        "essas", "esse", "esses", "esta", "está", "estão", "estas", "este", "estes", "eu",
        "foi", "for", "há", "isso", "isto", "já", "lhe", "mais", "mas", "me", "mesmo", "meu",
        "minha", "muito", "na", "nas", "não", "nem", "no", "nos", "nós", "nossa", "nosso",
        "num", "numa", "o", "os", "ou", "para", "pela", "pelas", "pelo", "pelos", "por",
        "qual", "quando", "que", "quem", "se", "sem", "ser", "seu", "seus", "sua", "suas",
        "também", "te", "tem", "têm", "ter", "um", "uma", "umas", "uns", "você", "vocês",
        "sobre", "bem", "boa", "bom", "cada", "todo", "toda", "todos", "todas", "outro",
        "outra", "outros", "outras", "onde", "ainda", "além", "sempre", "seja", "sejam",
        "ser", "são", "sendo", "possui", "possuir", "ter", "tenha", "junto", "dentro",
        "partir", "através", "etc",
    ];
    const DOMAIN: &[&str] = &[
        "via", "forte", "fins", "setor", "cargo", "assim", "uso", "área", "caso",
        "utilizando", "semana", "gosto", "precisamos", "conhecimento", "áreas", "público",
        "criar", "capacidade", "ferramentas", "ferramenta", "práticas", "prática",
        "concluído", "formação", "atividade", "comprovada", "sp", "cursando", "melhoria",
        "conceitos", "aumentar", "otimizar", "região", "pirataria", "riscos", "diferencial",
        "utilizados", "experiência", "será", "deve", "deverá",
    ];
    const PLACEHOLDER: &[&str] = &["not", "informed", "informado"];

    PORTUGUESE
        .iter()
        .chain(DOMAIN)
        .chain(PLACEHOLDER)
        .copied()
        .collect()
});

/// Which rows to analyse and how many terms to report.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnalysisFilter {
    /// First publication date to include.
    pub from: Option<NaiveDate>,
    /// Last publication date to include.
    pub to: Option<NaiveDate>,
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for AnalysisFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            top: DEFAULT_TOP_TERMS,
        }
    }
}

fn default_top() -> usize {
    DEFAULT_TOP_TERMS
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Share {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RegionShare {
    pub region: String,
    pub count: usize,
    pub cities: Vec<Share>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AnalysisReport {
    pub total_listings: usize,
    pub first_published: Option<NaiveDate>,
    pub last_published: Option<NaiveDate>,
    /// Days between the oldest and newest publication date.
    pub observed_days: Option<i64>,
    pub by_date: Vec<DateCount>,
    pub by_company: Vec<Share>,
    pub by_work_arrangement: Vec<Share>,
    pub by_employment_type: Vec<Share>,
    pub by_location: Vec<RegionShare>,
    /// Most frequent words in the qualifications column.
    pub qualification_terms: Vec<TermCount>,
    /// Most frequent words across qualifications and responsibilities.
    pub combined_terms: Vec<TermCount>,
}

/// Parses the portal's free-text publication date.
pub fn parse_published(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
}

pub fn analyze(table: &JobTable, filter: &AnalysisFilter) -> AnalysisReport {
    let windowed = filter.from.is_some() || filter.to.is_some();
    let rows: Vec<(&JobRow, Option<NaiveDate>)> = table
        .rows
        .iter()
        .map(|row| (row, parse_published(&row.published_at)))
        .filter(|(_, date)| match (windowed, date) {
            (false, _) => true,
            (true, None) => false,
            (true, Some(date)) => {
                filter.from.map_or(true, |from| *date >= from)
                    && filter.to.map_or(true, |to| *date <= to)
            }
        })
        .collect();

    let dates: Vec<NaiveDate> = rows.iter().filter_map(|(_, date)| *date).collect();
    let first_published = dates.iter().min().copied();
    let last_published = dates.iter().max().copied();

    let mut per_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in &dates {
        *per_date.entry(*date).or_default() += 1;
    }

    let qualifications = rows.iter().map(|(row, _)| row.qualifications.as_str());
    let responsibilities = rows.iter().map(|(row, _)| row.responsibilities.as_str());

    AnalysisReport {
        total_listings: rows.len(),
        first_published,
        last_published,
        observed_days: first_published
            .zip(last_published)
            .map(|(first, last)| (last - first).num_days()),
        by_date: per_date
            .into_iter()
            .map(|(date, count)| DateCount { date, count })
            .collect(),
        by_company: shares(rows.iter().map(|(row, _)| row.company.as_str())),
        by_work_arrangement: shares(rows.iter().map(|(row, _)| row.work_arrangement.as_str())),
        by_employment_type: shares(rows.iter().map(|(row, _)| row.employment_type.as_str())),
        by_location: locations(&rows),
        qualification_terms: top_terms(qualifications.clone(), filter.top),
        combined_terms: top_terms(qualifications.chain(responsibilities), filter.top),
    }
}

/// Counts each label, largest first, ties alphabetical.
fn shares<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<Share> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0;
    for label in labels {
        *counts.entry(label).or_default() += 1;
        total += 1;
    }

    let mut shares: Vec<Share> = counts
        .into_iter()
        .map(|(label, count)| Share {
            label: label.to_string(),
            count,
            percent: 100.0 * count as f64 / total as f64,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    shares
}

fn locations(rows: &[(&JobRow, Option<NaiveDate>)]) -> Vec<RegionShare> {
    let mut by_region: HashMap<&str, Vec<&str>> = HashMap::new();
    for (row, _) in rows {
        by_region
            .entry(row.region.as_str())
            .or_default()
            .push(row.city.as_str());
    }

    let mut regions: Vec<RegionShare> = by_region
        .into_iter()
        .map(|(region, cities)| RegionShare {
            region: region.to_string(),
            count: cities.len(),
            cities: shares(cities.into_iter()),
        })
        .collect();
    regions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.region.cmp(&b.region)));
    regions
}

fn top_terms<'a>(texts: impl Iterator<Item = &'a str>, top: usize) -> Vec<TermCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        if text == NOT_INFORMED {
            continue;
        }
        let lowered = text.to_lowercase();
        for word in WORD.find_iter(&lowered).map(|m| m.as_str()) {
            if word.chars().count() < 2 || STOPWORDS.contains(word) {
                continue;
            }
            *counts.entry(word.to_string()).or_default() += 1;
        }
    }

    let mut terms: Vec<TermCount> = counts
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    terms.truncate(top);
    terms
}
