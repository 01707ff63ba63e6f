//! Command-line arguments for `vitrine-preview`

use std::path::PathBuf;

use clap::Parser;

/// Render an engraving for a configured model set
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "vitrine-preview")]
#[command(about = "Render engraving rasters for a material and model set", long_about = None)]
pub struct PreviewArgs {
    /// Material set document (JSON)
    pub materials: PathBuf,

    /// Model set document (JSON)
    pub models: PathBuf,

    /// Engraving text
    pub text: String,

    /// Width over height of the engraving raster, overriding the measured aspect
    #[arg(long)]
    pub aspect: Option<f32>,

    /// Extra tag enabled before the text is set (repeatable)
    #[arg(long = "tag", value_name = "NAME")]
    pub tags: Vec<String>,

    /// Directory receiving the alpha and normal PNG files
    #[arg(long = "out", value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Where to write the material table after the session
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_only() {
        let parsed =
            PreviewArgs::try_parse_from(["vitrine-preview", "m.json", "models.json", "Hello"])
                .unwrap();
        assert_eq!(parsed.materials, PathBuf::from("m.json"));
        assert_eq!(parsed.models, PathBuf::from("models.json"));
        assert_eq!(parsed.text, "Hello");
        assert_eq!(parsed.aspect, None);
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.out_dir, PathBuf::from("."));
        assert_eq!(parsed.export, None);
    }

    #[test]
    fn test_options() {
        let parsed = PreviewArgs::try_parse_from([
            "vitrine-preview",
            "--aspect",
            "2.5",
            "m.json",
            "--tag",
            "gold",
            "--tag",
            "silver",
            "models.json",
            "Hi",
            "--out",
            "out",
            "--export",
            "edited.json",
        ])
        .unwrap();
        assert_eq!(parsed.aspect, Some(2.5));
        assert_eq!(parsed.tags, vec!["gold", "silver"]);
        assert_eq!(parsed.out_dir, PathBuf::from("out"));
        assert_eq!(parsed.export, Some(PathBuf::from("edited.json")));
        assert_eq!(parsed.text, "Hi");
    }

    #[test]
    fn test_errors() {
        assert!(PreviewArgs::try_parse_from(["vitrine-preview", "m.json", "models.json"]).is_err());
        assert!(
            PreviewArgs::try_parse_from(["vitrine-preview", "a", "b", "c", "--aspect", "wide"])
                .is_err()
        );
        assert!(PreviewArgs::try_parse_from(["vitrine-preview", "a", "b", "c", "--verbose"]).is_err());
        assert!(PreviewArgs::try_parse_from(["vitrine-preview", "a", "b", "c", "--out"]).is_err());
    }
}
