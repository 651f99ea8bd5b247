//! `tether types`: list the registered types and their members.

use tether_sdk::{TypeDescriptor, Visibility};

use crate::host;
use crate::output::StyledOutput;

fn visibility(v: Visibility) -> &'static str {
    match v {
        Visibility::Public => "public",
        Visibility::Protected => "protected",
        Visibility::Private => "private",
    }
}

/// One line per member, e.g. `public static method create/1`.
pub fn describe(desc: &TypeDescriptor) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(sup) = desc.superclass() {
        lines.push(format!("extends {}", sup));
    }
    if let Some(outer) = desc.enclosing() {
        lines.push(format!("nested in {}", outer));
    }
    for m in desc.methods() {
        lines.push(format!(
            "{} {}method {}/{}",
            visibility(m.visibility()),
            if m.is_static() { "static " } else { "" },
            m.name(),
            m.arity()
        ));
    }
    for f in desc.fields() {
        lines.push(format!(
            "{} {}{}field {}",
            visibility(f.visibility()),
            if f.is_static() { "static " } else { "" },
            if f.is_writable() { "" } else { "read-only " },
            f.name()
        ));
    }
    lines
}

pub fn execute() -> anyhow::Result<()> {
    let types = host::types()?;
    let mut out = StyledOutput::new();
    for name in types.type_names() {
        let Some(desc) = types.get(name) else { continue };
        out.header(name)?;
        for line in describe(desc) {
            out.detail(&line)?;
        }
    }
    Ok(())
}
