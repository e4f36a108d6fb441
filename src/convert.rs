use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::error::{CotejoError, Result};
use crate::settings::Settings;

/// Turns an input file into something `workbook::read_grids` can open.
pub trait FormatConverter {
    fn convert(&self, path: &Path) -> Result<PathBuf>;
}

/// Calamine reads `.xls` directly, so no conversion is needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeConverter;

impl FormatConverter for NativeConverter {
    fn convert(&self, path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(CotejoError::FileNotFound(path.to_path_buf()));
        }
        Ok(path.to_path_buf())
    }
}

pub fn is_legacy(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("xls"))
}

/// Runs an external command for legacy `.xls` files, e.g.
/// `soffice --headless --convert-to xlsx --outdir {outdir} {input}`.
///
/// The command is expected to leave `{outdir}/{stem}.xlsx` behind.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    template: String,
    outdir: PathBuf,
}

impl CommandConverter {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            outdir: std::env::temp_dir().join("cotejo-convert"),
        }
    }

    pub fn with_outdir(mut self, outdir: impl Into<PathBuf>) -> Self {
        self.outdir = outdir.into();
        self
    }

    fn render_args(&self, input: &Path) -> Vec<String> {
        let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        self.template
            .split_whitespace()
            .map(|tok| {
                tok.replace("{input}", &input.to_string_lossy())
                    .replace("{outdir}", &self.outdir.to_string_lossy())
                    .replace("{stem}", stem)
            })
            .collect()
    }

    fn expected_output(&self, input: &Path) -> PathBuf {
        let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        self.outdir.join(format!("{stem}.xlsx"))
    }
}

impl FormatConverter for CommandConverter {
    fn convert(&self, path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(CotejoError::FileNotFound(path.to_path_buf()));
        }
        if !is_legacy(path) {
            return Ok(path.to_path_buf());
        }

        std::fs::create_dir_all(&self.outdir)?;
        let args = self.render_args(path);
        let Some((program, rest)) = args.split_first() else {
            return Err(CotejoError::Conversion("empty converter command".into()));
        };
        debug!("converting {} with {program}", path.display());

        let output = Command::new(program)
            .args(rest)
            .output()
            .map_err(|e| CotejoError::Conversion(format!("{program}: {e}")))?;
        if !output.status.success() {
            return Err(CotejoError::Conversion(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let produced = self.expected_output(path);
        if !produced.exists() {
            return Err(CotejoError::Conversion(format!(
                "{} was not produced",
                produced.display()
            )));
        }
        info!("converted {} -> {}", path.display(), produced.display());
        Ok(produced)
    }
}

/// Converter selected by the `converter` setting; output goes to `<data_dir>/converted`.
pub fn from_settings(settings: &Settings) -> Box<dyn FormatConverter> {
    match settings.converter.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(template) => Box::new(
            CommandConverter::new(template).with_outdir(PathBuf::from(&settings.data_dir).join("converted")),
        ),
        None => Box::new(NativeConverter),
    }
}
