use miette::Result;

pub fn exec(env: &str) -> Result<()> {
    let project_root = super::current_project()?;
    println!("{}", elmui_ops::ops_config::show(&project_root, env)?);
    Ok(())
}
