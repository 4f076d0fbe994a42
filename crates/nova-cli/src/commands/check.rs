//! `nova check`: lower a document and report failures without printing IR.

use std::path::Path;

use anyhow::bail;
use nova_codegen::Codegen;

use crate::commands::load_document;
use crate::output::{resolve_color_choice, StyledOutput};

pub fn run(file: &Path, color: &str) -> anyhow::Result<()> {
    let mut out = StyledOutput::new(resolve_color_choice(color));

    let document = load_document(file)?;
    let codegen = Codegen::host()?;
    let (module, failures) = codegen.lower_program(&document);

    out.report_failures(&failures);
    if !failures.is_empty() {
        bail!("{} function(s) failed to lower", failures.len());
    }
    out.success(&format!("{} function(s) ok", module.len()));
    Ok(())
}
