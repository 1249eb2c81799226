use crate::core::engine::{RunOutput, Section};
use crate::report::charts;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use svg2pdf::usvg;
use svg2pdf::{ConversionOptions, PageOptions};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

struct Figure {
    name: &'static str,
    svg: String,
}

/// Chart files a previous export may have left behind.
const FIGURE_NAMES: [&str; 3] = [
    "substitution_heatmap",
    "substitution_spectrum",
    "indel_lengths",
];

/// Writes `figures/`, `tables/` and a zip bundle of both under `out_dir`.
/// Returns the path of the bundle.
pub fn write(out_dir: &Path, output: &RunOutput, bundle_stem: &str) -> Result<PathBuf> {
    let figures_dir = out_dir.join("figures");
    let tables_dir = out_dir.join("tables");
    remove_stale_figures(&figures_dir)?;
    fs::create_dir_all(&figures_dir)
        .with_context(|| format!("failed to create {}", figures_dir.display()))?;
    fs::create_dir_all(&tables_dir)
        .with_context(|| format!("failed to create {}", tables_dir.display()))?;

    let mut figures = Vec::new();
    if let Section::Ready(matrix) = &output.changes {
        figures.push(Figure {
            name: "substitution_heatmap",
            svg: charts::heatmap_svg(matrix)?,
        });
        figures.push(Figure {
            name: "substitution_spectrum",
            svg: charts::spectrum_svg(&matrix.class_counts())?,
        });
    }
    if let Section::Ready(profile) = &output.indels {
        figures.push(Figure {
            name: "indel_lengths",
            svg: charts::indel_bars_svg(profile)?,
        });
    }
    let mut entries = write_figures(&figures_dir, &figures)?;
    write_substitution_table(&tables_dir.join("substitutions.tsv"), output)?;
    write_indel_table(&tables_dir.join("indel_lengths.tsv"), output)?;
    entries.push("tables/indel_lengths.tsv".to_string());
    entries.push("tables/substitutions.tsv".to_string());

    let zip_path = out_dir.join(format!("{}_varstats_figures.zip", bundle_stem));
    write_zip(&zip_path, out_dir, &entries)?;
    Ok(zip_path)
}

fn remove_stale_figures(dir: &Path) -> Result<()> {
    for name in FIGURE_NAMES {
        for ext in ["svg", "pdf"] {
            let path = dir.join(format!("{}.{}", name, ext));
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
        }
    }
    Ok(())
}

/// Returns the bundle-relative paths written.
fn write_figures(dir: &Path, figures: &[Figure]) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(figures.len() * 2);
    for f in figures {
        let svg_path = dir.join(format!("{}.svg", f.name));
        fs::write(&svg_path, &f.svg)
            .with_context(|| format!("failed to write {}", svg_path.display()))?;
        let pdf =
            svg_to_pdf(&f.svg).with_context(|| format!("failed to convert {} to PDF", f.name))?;
        let pdf_path = dir.join(format!("{}.pdf", f.name));
        fs::write(&pdf_path, pdf)
            .with_context(|| format!("failed to write {}", pdf_path.display()))?;
        written.push(format!("figures/{}.svg", f.name));
        written.push(format!("figures/{}.pdf", f.name));
    }
    Ok(written)
}

fn write_substitution_table(path: &Path, output: &RunOutput) -> Result<()> {
    let mut w = BufWriter::new(
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
    );
    writeln!(w, "class\treference\talternate\tcount")?;
    if let Section::Ready(matrix) = &output.changes {
        for (class, count) in matrix.class_counts() {
            let (reference, alternate) = class.anchored();
            writeln!(w, "{}\t{}\t{}\t{}", class, reference, alternate, count)?;
        }
    }
    w.flush()?;
    Ok(())
}

fn write_indel_table(path: &Path, output: &RunOutput) -> Result<()> {
    let mut w = BufWriter::new(
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
    );
    writeln!(w, "length\tcount")?;
    if let Section::Ready(profile) = &output.indels {
        for (length, count) in profile.entries() {
            writeln!(w, "{}\t{}", length, count)?;
        }
    }
    w.flush()?;
    Ok(())
}

fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| anyhow::anyhow!("usvg parse failed: {e}"))?;
    let pdf = svg2pdf::to_pdf(&tree, ConversionOptions::default(), PageOptions::default())
        .map_err(|e| anyhow::anyhow!("svg2pdf conversion failed: {e}"))?;
    Ok(pdf)
}

/// Builds the archive next to its final name and renames it into place.
fn write_zip(zip_path: &Path, out_dir: &Path, entries: &[String]) -> Result<()> {
    let tmp_path = zip_path.with_extension("zip.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let result = write_zip_entries(&mut zip, out_dir, entries);

    match result.and_then(|_| zip.finish().with_context(|| "failed to finalize zip")) {
        Ok(_) => {
            fs::rename(&tmp_path, zip_path)
                .with_context(|| format!("failed to move zip to {}", zip_path.display()))?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn write_zip_entries(zip: &mut ZipWriter<File>, out_dir: &Path, entries: &[String]) -> Result<()> {
    let epoch = zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
        .map_err(|e| anyhow::anyhow!("invalid zip timestamp: {e}"))?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(epoch);

    for sub in ["figures", "tables"] {
        zip.add_directory(format!("{}/", sub), options)
            .with_context(|| format!("failed to add {} to zip", sub))?;
    }
    let mut names = entries.to_vec();
    names.sort();
    for name in names {
        let data = fs::read(out_dir.join(&name))
            .with_context(|| format!("failed to read {}", name))?;
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&data)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bcfstats::{self, tests::STATS};
    use crate::core::engine::{indel_section, substitution_section};
    use std::io::Read;

    fn output_for(stats: &str) -> RunOutput {
        let tables = bcfstats::parse(stats.as_bytes(), "S").unwrap();
        RunOutput {
            samples: vec!["S".to_string()],
            changes: substitution_section(&tables),
            indels: indel_section(&tables),
            summaries: Vec::new(),
            tables,
            versions: Vec::new(),
            params: Vec::new(),
        }
    }

    #[test]
    fn exports_tables_and_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = write(dir.path(), &output_for(STATS), "S").unwrap();
        assert_eq!(zip_path, dir.path().join("S_varstats_figures.zip"));

        let subs = fs::read_to_string(dir.path().join("tables/substitutions.tsv")).unwrap();
        let lines: Vec<&str> = subs.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[3], "C>T\tC\tT\t340");
        assert_eq!(lines[4], "T>A\tA\tT\t65");

        let indels = fs::read_to_string(dir.path().join("tables/indel_lengths.tsv")).unwrap();
        assert!(indels.starts_with("length\tcount\n-4\t0\n-3\t10\n"));

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(|s| s.to_string()).collect();
        names.sort();
        assert!(names.contains(&"figures/substitution_heatmap.svg".to_string()));
        assert!(names.contains(&"figures/indel_lengths.pdf".to_string()));
        assert!(names.contains(&"tables/indel_lengths.tsv".to_string()));
        let mut pdf = Vec::new();
        archive
            .by_name("figures/substitution_spectrum.pdf")
            .unwrap()
            .read_to_end(&mut pdf)
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert!(!dir.path().join("S_varstats_figures.zip.tmp").exists());
    }

    #[test]
    fn empty_sections_export_headers_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &output_for(""), "S").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("tables/substitutions.tsv")).unwrap(),
            "class\treference\talternate\tcount\n"
        );
        assert_eq!(fs::read_dir(dir.path().join("figures")).unwrap().count(), 0);
    }

    #[test]
    fn reused_directory_drops_previous_charts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &output_for(STATS), "S").unwrap();
        fs::write(dir.path().join("figures/notes.txt"), "kept out of the bundle").unwrap();

        let zip_path = write(dir.path(), &output_for(""), "S").unwrap();
        let archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "figures/",
                "tables/",
                "tables/indel_lengths.tsv",
                "tables/substitutions.tsv"
            ]
        );
        assert!(!dir.path().join("figures/substitution_heatmap.svg").exists());
        assert!(!dir.path().join("figures/indel_lengths.pdf").exists());
    }
}
