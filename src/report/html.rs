use crate::core::bcfstats::StatsTable;
use crate::core::engine::{RunOutput, Section};
use crate::core::metrics::summary::{display_sn_table, display_tstv_table};
use crate::core::model::SampleSummary;
use crate::report::charts;
use crate::report::format::{escape_xml as escape_html, fmt_int, fmt_timestamp};
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const REPORT_TITLE: &str = "Small variation statistics";
pub const EMPTY_STATS: &str = "The bcftools stats file is empty.";

const SECTION_GLANCE: (&str, &str) = ("at_a_glance", "At a glance");
const SECTION_STATS: (&str, &str) = ("statistics", "Statistics");
const SECTION_TYPES: (&str, &str) = ("substitution_types", "Substitution types");
const SECTION_INDELS: (&str, &str) = ("indels_length", "Indels length");
const SECTION_VERSIONS: (&str, &str) = ("software_versions", "Software versions");
const SECTION_PARAMS: (&str, &str) = ("workflow_parameters", "Workflow parameters");

pub fn write(path: &Path, output: &RunOutput) -> Result<()> {
    let html = render(output)?;
    let mut w = BufWriter::new(
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
    );
    w.write_all(html.as_bytes())?;
    w.flush()?;
    Ok(())
}

pub fn render(output: &RunOutput) -> Result<String> {
    let mut html = String::with_capacity(128 * 1024);
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>"
    )?;
    writeln!(
        html,
        "<title>{}: {}</title>",
        REPORT_TITLE,
        escape_html(&output.samples.join(", "))
    )?;
    write_style(&mut html)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;

    let mut sections = vec![SECTION_GLANCE, SECTION_STATS, SECTION_TYPES, SECTION_INDELS];
    if !output.versions.is_empty() {
        sections.push(SECTION_VERSIONS);
    }
    if !output.params.is_empty() {
        sections.push(SECTION_PARAMS);
    }

    writeln!(html, "<div class=\"page\">")?;
    writeln!(html, "<aside class=\"sidebar\">")?;
    writeln!(html, "<h2 id=\"contents\">Contents</h2>")?;
    writeln!(html, "<ul>")?;
    for (id, title) in &sections {
        writeln!(html, "<li><a href=\"#{}\">{}</a></li>", id, title)?;
    }
    writeln!(html, "</ul>")?;
    writeln!(html, "</aside>")?;

    writeln!(html, "<main class=\"main\">")?;
    writeln!(html, "<h1>{}</h1>", REPORT_TITLE)?;
    writeln!(
        html,
        "<div class=\"meta\">Samples: <b>{}</b><br/>Timestamp: {} (unix: {})</div>",
        escape_html(&output.samples.join(", ")),
        fmt_timestamp(ts),
        ts
    )?;

    section_at_a_glance(&mut html, output)?;
    section_statistics(&mut html, output)?;
    section_substitutions(&mut html, output)?;
    section_indels(&mut html, output)?;
    if !output.versions.is_empty() {
        section_versions(&mut html, output)?;
    }
    if !output.params.is_empty() {
        section_params(&mut html, output)?;
    }

    writeln!(
        html,
        "<div class=\"meta\">Produced by kira-varstats {}</div>",
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(html, "</main>")?;
    writeln!(html, "</div>")?;

    html.push_str("<script>");
    html.push_str(r#"document.querySelectorAll('.tabs').forEach(g=>{const b=g.querySelectorAll('.tab-btn');b.forEach(btn=>{btn.addEventListener('click',()=>{b.forEach(x=>x.classList.remove('active'));g.querySelectorAll('.tab-panel').forEach(p=>p.classList.remove('active'));btn.classList.add('active');document.getElementById(btn.dataset.target).classList.add('active');});});});"#);
    html.push_str(r#"document.querySelectorAll('table.sortable').forEach(t=>{const h=t.querySelectorAll('th');h.forEach((th,i)=>{th.style.cursor='pointer';th.addEventListener('click',()=>{const rows=[...t.querySelectorAll('tr')].slice(1);const asc=th.getAttribute('data-asc')!=='true';rows.sort((a,b)=>{const av=a.children[i].innerText;const bv=b.children[i].innerText;const an=parseFloat(av);const bn=parseFloat(bv);if(!isNaN(an)&&!isNaN(bn)){return asc?an-bn:bn-an;}return asc?av.localeCompare(bv):bv.localeCompare(av);});th.setAttribute('data-asc',asc);rows.forEach(r=>t.appendChild(r));});});});"#);
    html.push_str("</script>");
    writeln!(html, "</body></html>")?;
    Ok(html)
}

fn write_style(html: &mut String) -> Result<()> {
    writeln!(html, "<style>")?;
    writeln!(
        html,
        "body{{font-family:Arial,Helvetica,sans-serif;margin:0;background:#eee;color:#222;}}"
    )?;
    writeln!(
        html,
        ".page{{display:flex;align-items:flex-start;gap:16px;padding:16px;}}"
    )?;
    writeln!(
        html,
        ".sidebar{{width:220px;position:sticky;top:16px;align-self:flex-start;background:#f6f6f6;border:1px solid #ddd;border-radius:4px;padding:10px;}}"
    )?;
    writeln!(html, ".sidebar h2{{margin:4px 0 8px 0;font-size:16px;}}")?;
    writeln!(html, ".sidebar ul{{list-style:none;margin:0;padding:0;}}")?;
    writeln!(html, ".sidebar li{{padding:4px 0;font-size:13px;}}")?;
    writeln!(html, ".sidebar a{{color:#003366;text-decoration:none;}}")?;
    writeln!(html, ".sidebar a:hover{{text-decoration:underline;}}")?;
    writeln!(
        html,
        ".main{{flex:1;background:#fff;border:1px solid #ddd;border-radius:4px;box-shadow:0 1px 3px rgba(0,0,0,0.08);padding:16px 20px;}}"
    )?;
    writeln!(html, "h1{{margin:0 0 6px 0;font-size:22px;}}")?;
    writeln!(html, "h2{{margin:20px 0 6px 0;font-size:18px;}}")?;
    writeln!(
        html,
        ".meta{{color:#555;font-size:12px;margin-bottom:12px;}}"
    )?;
    writeln!(
        html,
        ".module{{padding:8px 0 14px 0;border-bottom:1px solid #eee;}}"
    )?;
    writeln!(html, ".module:last-child{{border-bottom:none;}}")?;
    writeln!(html, ".plot{{margin:8px 0 6px 0;}}")?;
    writeln!(
        html,
        ".desc{{color:#444;font-size:13px;max-width:1000px;margin:4px 0 10px 0;}}"
    )?;
    writeln!(html, ".error{{color:#c00000;font-weight:bold;}}")?;
    writeln!(
        html,
        ".table{{border-collapse:collapse;max-width:1000px;font-size:12px;margin:6px 0 12px 0;}}"
    )?;
    writeln!(
        html,
        ".table th,.table td{{border:1px solid #ddd;padding:4px 6px;text-align:right;}}"
    )?;
    writeln!(html, ".table th{{background:#3b6ea5;color:#fff;}}")?;
    writeln!(
        html,
        ".table th:first-child,.table td:first-child{{text-align:left;}}"
    )?;
    writeln!(
        html,
        ".tab-bar{{display:flex;gap:4px;border-bottom:1px solid #ddd;margin:6px 0 8px 0;}}"
    )?;
    writeln!(
        html,
        ".tab-btn{{border:1px solid #ddd;border-bottom:none;background:#f6f6f6;padding:4px 10px;font-size:13px;cursor:pointer;border-radius:4px 4px 0 0;}}"
    )?;
    writeln!(
        html,
        ".tab-btn.active{{background:#fff;font-weight:bold;}}"
    )?;
    writeln!(html, ".tab-panel{{display:none;}}")?;
    writeln!(html, ".tab-panel.active{{display:block;}}")?;
    writeln!(
        html,
        ".stats{{display:grid;grid-template-columns:repeat(4,minmax(120px,1fr));gap:12px;max-width:800px;}}"
    )?;
    writeln!(
        html,
        ".stat{{background:#f6f6f6;border:1px solid #e5e5e5;border-radius:4px;padding:10px 12px;}}"
    )?;
    writeln!(html, ".stat-value{{font-size:22px;font-weight:bold;}}")?;
    writeln!(html, ".stat-label{{color:#555;font-size:12px;}}")?;
    writeln!(
        html,
        ".back{{font-size:12px;margin-top:6px;display:inline-block;}}"
    )?;
    writeln!(
        html,
        "section:target{{outline:2px solid #99c;outline-offset:4px;border-radius:4px;}}"
    )?;
    writeln!(html, "svg{{background:#fafafa;border:1px solid #e5e5e5;}}")?;
    writeln!(html, "</style>")?;
    Ok(())
}

fn section_header(out: &mut String, (id, title): (&str, &str)) -> Result<()> {
    writeln!(out, "<section id=\"{}\" class=\"module\">", id)?;
    writeln!(out, "<h2>{}</h2>", title)?;
    Ok(())
}

fn section_footer(out: &mut String) -> Result<()> {
    writeln!(
        out,
        "<a class=\"back\" href=\"#contents\">Back to contents</a>"
    )?;
    writeln!(out, "</section>")?;
    Ok(())
}

fn module_desc(out: &mut String, text: &str) -> Result<()> {
    writeln!(out, "<p class=\"desc\">{}</p>", text)?;
    Ok(())
}

fn placeholder(out: &mut String, text: &str) -> Result<()> {
    writeln!(out, "<p>{}</p>", escape_html(text))?;
    Ok(())
}

fn section_error(out: &mut String, message: &str) -> Result<()> {
    writeln!(
        out,
        "<p class=\"error\">Could not build this section: {}</p>",
        escape_html(message)
    )?;
    Ok(())
}

/// One tab per sample; `body` renders the panel of each.
fn sample_tabs<F>(out: &mut String, group: &str, samples: &[String], mut body: F) -> Result<()>
where
    F: FnMut(&mut String, &str) -> Result<()>,
{
    writeln!(out, "<div class=\"tabs\">")?;
    writeln!(out, "<div class=\"tab-bar\">")?;
    for (i, sample) in samples.iter().enumerate() {
        writeln!(
            out,
            "<button type=\"button\" class=\"tab-btn{}\" data-target=\"{}-{}\">{}</button>",
            if i == 0 { " active" } else { "" },
            group,
            i,
            escape_html(sample)
        )?;
    }
    writeln!(out, "</div>")?;
    for (i, sample) in samples.iter().enumerate() {
        writeln!(
            out,
            "<div class=\"tab-panel{}\" id=\"{}-{}\">",
            if i == 0 { " active" } else { "" },
            group,
            i
        )?;
        body(out, sample)?;
        writeln!(out, "</div>")?;
    }
    writeln!(out, "</div>")?;
    Ok(())
}

fn section_at_a_glance(out: &mut String, output: &RunOutput) -> Result<()> {
    section_header(out, SECTION_GLANCE)?;
    sample_tabs(out, "glance", &output.samples, |o, sample| {
        match output
            .summaries
            .iter()
            .find(|(s, _)| s == sample)
            .and_then(|(_, summary)| summary.as_ref())
        {
            Some(summary) => stat_tiles(o, summary),
            None => placeholder(o, EMPTY_STATS),
        }
    })?;
    section_footer(out)
}

fn stat_tiles(out: &mut String, s: &SampleSummary) -> Result<()> {
    let count = |v: Option<u64>| v.map(fmt_int).unwrap_or_else(|| "-".to_string());
    let items = [
        (count(s.records), "Variants"),
        (count(s.snvs), "SNVs"),
        (count(s.indels), "Indels"),
        (
            s.ts_tv.clone().unwrap_or_else(|| "-".to_string()),
            "Ti/Tv",
        ),
    ];
    writeln!(out, "<div class=\"stats\">")?;
    for (value, label) in items {
        writeln!(
            out,
            "<div class=\"stat\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>",
            escape_html(&value),
            label
        )?;
    }
    writeln!(out, "</div>")?;
    Ok(())
}

fn section_statistics(out: &mut String, output: &RunOutput) -> Result<()> {
    section_header(out, SECTION_STATS)?;
    sample_tabs(out, "stats", &output.samples, |o, sample| {
        let Some(sn) = display_sn_table(&output.tables, sample) else {
            return placeholder(o, EMPTY_STATS);
        };
        data_table(o, &sn)?;
        if let Some(tstv) = display_tstv_table(&output.tables, sample) {
            data_table(o, &tstv)?;
        }
        Ok(())
    })?;
    section_footer(out)
}

fn section_substitutions(out: &mut String, output: &RunOutput) -> Result<()> {
    section_header(out, SECTION_TYPES)?;
    module_desc(
        out,
        "Base substitutions aggregated across all samples (symmetrised by pairing).",
    )?;
    match &output.changes {
        Section::Empty => placeholder(out, EMPTY_STATS)?,
        Section::Failed(msg) => section_error(out, msg)?,
        Section::Ready(matrix) => {
            writeln!(out, "<div class=\"plot\">{}</div>", charts::heatmap_svg(matrix)?)?;
            module_desc(
                out,
                "Counts folded onto the six strand-symmetric classes (COSMIC colours).",
            )?;
            writeln!(
                out,
                "<div class=\"plot\">{}</div>",
                charts::spectrum_svg(&matrix.class_counts())?
            )?;
        }
    }
    section_footer(out)
}

fn section_indels(out: &mut String, output: &RunOutput) -> Result<()> {
    section_header(out, SECTION_INDELS)?;
    module_desc(
        out,
        "Insertion and deletion lengths aggregated across all samples.",
    )?;
    match &output.indels {
        Section::Empty => placeholder(out, EMPTY_STATS)?,
        Section::Failed(msg) => section_error(out, msg)?,
        Section::Ready(profile) => {
            writeln!(
                out,
                "<div class=\"plot\">{}</div>",
                charts::indel_bars_svg(profile)?
            )?;
        }
    }
    section_footer(out)
}

fn section_versions(out: &mut String, output: &RunOutput) -> Result<()> {
    section_header(out, SECTION_VERSIONS)?;
    writeln!(out, "<table class=\"table sortable\">")?;
    writeln!(out, "<tr><th>Name</th><th>Version</th></tr>")?;
    for v in &output.versions {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(&v.name),
            escape_html(&v.version)
        )?;
    }
    writeln!(out, "</table>")?;
    section_footer(out)
}

fn section_params(out: &mut String, output: &RunOutput) -> Result<()> {
    section_header(out, SECTION_PARAMS)?;
    writeln!(out, "<table class=\"table sortable\">")?;
    writeln!(out, "<tr><th>Key</th><th>Value</th></tr>")?;
    for (k, v) in &output.params {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(k),
            escape_html(v)
        )?;
    }
    writeln!(out, "</table>")?;
    section_footer(out)
}

fn data_table(out: &mut String, table: &StatsTable) -> Result<()> {
    writeln!(out, "<table class=\"table sortable\">")?;
    out.push_str("<tr>");
    for c in table.columns() {
        write!(out, "<th>{}</th>", escape_html(c))?;
    }
    out.push_str("</tr>\n");
    for row in table.rows() {
        out.push_str("<tr>");
        for v in row {
            write!(out, "<td>{}</td>", escape_html(v))?;
        }
        out.push_str("</tr>\n");
    }
    writeln!(out, "</table>")?;
    Ok(())
}
