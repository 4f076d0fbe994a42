//! `nova build`: lower a document and print the generated module.

use std::path::Path;

use anyhow::bail;
use nova_codegen::{Codegen, CodegenConfig, Linkage};

use crate::commands::load_document;
use crate::output::{resolve_color_choice, StyledOutput};

pub fn run(
    file: &Path,
    linkage: Linkage,
    module_name: String,
    strict: bool,
    color: &str,
) -> anyhow::Result<()> {
    let mut out = StyledOutput::new(resolve_color_choice(color));

    let document = load_document(file)?;
    let codegen = Codegen::new(CodegenConfig { module_name, linkage })?;
    let (module, failures) = codegen.lower_program(&document);

    print!("{module}");
    out.report_failures(&failures);

    if failures.is_empty() {
        out.success(&format!("{} function(s) generated", module.len()));
    } else if strict {
        bail!("{} function(s) failed to lower", failures.len());
    }
    Ok(())
}
