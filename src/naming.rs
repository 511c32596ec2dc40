//! `Qin` values embedded in sweep file names
//!
//! Two conventions are read:
//! * run prefixes `output_Qin_8.00_`, with run files `output_Qin_8.00_3.txt`
//! * single files `output_Qin_8.00.txt`

use std::path::{Path, PathBuf};

/// `Qin` of a run prefix: its second-to-last `_`-separated token.
pub fn qin_from_prefix(prefix: &str) -> Option<f64> {
    let mut tokens = prefix.rsplit('_');
    tokens.next()?;
    parse_qin(tokens.next()?)
}

/// `Qin` of a single-file name: the last `_`-separated token of the stem.
pub fn qin_from_file_name(path: &Path) -> Option<f64> {
    let stem = path.file_stem()?.to_str()?;
    parse_qin(stem.rsplit('_').next()?)
}

/// File of run `run` under `prefix`.
pub fn run_path(prefix: &str, run: u32) -> PathBuf {
    PathBuf::from(format!("{prefix}{run}.txt"))
}

/// Plot/file label of a `Qin` value: `1.0`, `2.5`, `10.0`.
pub fn qin_label(qin: f64) -> String {
    format!("{qin:?}")
}

fn parse_qin(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|q| q.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_form() {
        assert_eq!(qin_from_prefix("output_Qin_8.00_"), Some(8.0));
        assert_eq!(qin_from_prefix("runs/a_b/output_Qin_2.50_"), Some(2.5));
        assert_eq!(qin_from_prefix("output_Qin_x_"), None);
        assert_eq!(qin_from_prefix("nounderscore"), None);
        assert_eq!(qin_from_prefix("output_Qin_inf_"), None);
    }

    #[test]
    fn test_file_form() {
        assert_eq!(qin_from_file_name(Path::new("output_Qin_1.5.txt")), Some(1.5));
        assert_eq!(
            qin_from_file_name(Path::new("/data/out_Qin_10.00.txt")),
            Some(10.0)
        );
        assert_eq!(qin_from_file_name(Path::new("output.txt")), None);
    }

    #[test]
    fn test_run_path_and_label() {
        assert_eq!(
            run_path("output_Qin_3.00_", 7),
            PathBuf::from("output_Qin_3.00_7.txt")
        );
        assert_eq!(qin_label(1.0), "1.0");
        assert_eq!(qin_label(2.5), "2.5");
    }
}
