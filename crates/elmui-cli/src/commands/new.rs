use std::path::Path;

use miette::Result;

pub fn exec(directory: &Path) -> Result<()> {
    let summary = elmui_ops::ops_new::scaffold(directory)?;
    for skipped in &summary.skipped {
        elmui_util::progress::status_warn("Kept", &format!("existing {skipped}"));
    }
    println!("Scaffolded new project into {}", directory.display());
    Ok(())
}
