use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SoftwareVersion {
    pub name: String,
    pub version: String,
}

/// Reads every `*.csv` in `dir`; each row is `name,version` with no header.
pub fn load_versions(dir: &Path) -> Result<Vec<SoftwareVersion>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read versions directory {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    let mut versions = Vec::new();
    for path in files {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        for rec in reader.records() {
            let rec = rec.with_context(|| format!("failed to parse {}", path.display()))?;
            let (Some(name), Some(version)) = (rec.get(0), rec.get(1)) else {
                bail!(
                    "{}: expected name,version on line {}",
                    path.display(),
                    rec.position().map(|p| p.line()).unwrap_or(0)
                );
            };
            if name.is_empty() {
                continue;
            }
            versions.push(SoftwareVersion {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
    }
    versions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(versions)
}

/// Flattens a JSON object of workflow parameters into sorted `key = value` pairs.
pub fn load_params(path: &Path) -> Result<Vec<(String, String)>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {} as JSON", path.display()))?;
    let Value::Object(_) = value else {
        bail!("{}: expected a JSON object of parameters", path.display());
    };
    let mut out = Vec::new();
    flatten("", &value, &mut out);
    out.sort();
    Ok(out)
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten(&key, v, out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_versions_from_all_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "samtools,1.17\nbcftools, 1.17\n").unwrap();
        fs::write(dir.path().join("a.csv"), "clair3,1.0.4\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored,0\n").unwrap();
        let v = load_versions(dir.path()).unwrap();
        let names: Vec<&str> = v.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["bcftools", "clair3", "samtools"]);
        assert_eq!(v[0].version, "1.17");
    }

    #[test]
    fn short_version_row_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("v.csv"), "lonely\n").unwrap();
        assert!(load_versions(dir.path()).is_err());
    }

    #[test]
    fn flattens_nested_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(
            &path,
            r#"{"sample_name": "HG002", "threads": 4, "snp": {"min_qual": 10.5, "phased": false}, "tags": ["a", "b"], "bed": null}"#,
        )
        .unwrap();
        let p = load_params(&path).unwrap();
        assert_eq!(
            p,
            vec![
                ("bed".to_string(), "null".to_string()),
                ("sample_name".to_string(), "HG002".to_string()),
                ("snp.min_qual".to_string(), "10.5".to_string()),
                ("snp.phased".to_string(), "false".to_string()),
                ("tags".to_string(), r#"["a","b"]"#.to_string()),
                ("threads".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn params_must_be_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(load_params(&path).is_err());
    }
}
