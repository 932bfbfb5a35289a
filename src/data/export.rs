use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use super::model::Group;

// ---------------------------------------------------------------------------
// Flat rows – one table per concern, group id as the join key
// ---------------------------------------------------------------------------

/// One row per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Group ID")]
    pub group_id: usize,
    #[serde(rename = "Reel Count")]
    pub member_count: usize,
    #[serde(rename = "L* Range (min-max)")]
    pub l_range: String,
    #[serde(rename = "a* Range (min-max)")]
    pub a_range: String,
    #[serde(rename = "b* Range (min-max)")]
    pub b_range: String,
    #[serde(rename = "L* Min")]
    pub l_min: f64,
    #[serde(rename = "L* Max")]
    pub l_max: f64,
    #[serde(rename = "a* Min")]
    pub a_min: f64,
    #[serde(rename = "a* Max")]
    pub a_max: f64,
    #[serde(rename = "b* Min")]
    pub b_min: f64,
    #[serde(rename = "b* Max")]
    pub b_max: f64,
    #[serde(rename = "L* Range")]
    pub l_span: f64,
    #[serde(rename = "a* Range")]
    pub a_span: f64,
    #[serde(rename = "b* Range")]
    pub b_span: f64,
}

/// One row per measured reel, carrying the id of the group it landed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRow {
    #[serde(rename = "Fabric Roll Number")]
    pub label: String,
    #[serde(rename = "L*")]
    pub l: f64,
    #[serde(rename = "a*")]
    pub a: f64,
    #[serde(rename = "b*")]
    pub b: f64,
    #[serde(rename = "Shade Group ID")]
    pub group_id: usize,
}

pub fn summary_rows(groups: &[Group]) -> Vec<SummaryRow> {
    groups
        .iter()
        .map(|g| {
            let s = g.summary();
            SummaryRow {
                group_id: g.id(),
                member_count: g.member_count(),
                l_range: s.l.to_string(),
                a_range: s.a.to_string(),
                b_range: s.b.to_string(),
                l_min: s.l.min,
                l_max: s.l.max,
                a_min: s.a.min,
                a_max: s.a.max,
                b_min: s.b.min,
                b_max: s.b.max,
                l_span: s.l.range,
                a_span: s.a.range,
                b_span: s.b.range,
            }
        })
        .collect()
}

/// Members in group-id order, then assignment order within each group.
pub fn member_rows(groups: &[Group]) -> Vec<MemberRow> {
    groups
        .iter()
        .flat_map(|g| {
            g.members().iter().map(move |r| MemberRow {
                label: r.label.clone(),
                l: r.l,
                a: r.a,
                b: r.b,
                group_id: g.id(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// `grouped_colors_YYYYMMDD_HHMMSS`, local time.
pub fn default_stem() -> String {
    format!(
        "grouped_colors_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

fn ensure_not_empty(groups: &[Group]) -> Result<()> {
    if groups.is_empty() {
        bail!("No grouped data to export");
    }
    Ok(())
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Write `<stem>_summary.csv` and `<stem>_members.csv` into `dir`.
///
/// Returns `(summary_path, members_path)`.
pub fn write_csv(groups: &[Group], dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf)> {
    ensure_not_empty(groups)?;

    let summary_path = dir.join(format!("{stem}_summary.csv"));
    let members_path = dir.join(format!("{stem}_members.csv"));
    write_table(&summary_path, &summary_rows(groups)).context("Failed to export summary")?;
    write_table(&members_path, &member_rows(groups)).context("Failed to export members")?;

    log::info!(
        "Exported {} groups to {} and {}",
        groups.len(),
        summary_path.display(),
        members_path.display()
    );
    Ok((summary_path, members_path))
}

#[derive(Serialize)]
struct JsonExport<'a> {
    summary: Vec<SummaryRow>,
    groups: &'a [Group],
}

/// Write both views into one JSON document:
/// `{ "summary": [<SummaryRow>...], "groups": [{ groupId, colors, summary }...] }`.
pub fn write_json(groups: &[Group], path: &Path) -> Result<()> {
    ensure_not_empty(groups)?;

    let doc = JsonExport {
        summary: summary_rows(groups),
        groups,
    };
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &doc)
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;

    log::info!("Exported {} groups to {}", groups.len(), path.display());
    Ok(())
}
