use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = file_uploader::cli::parse();
    app::run(args)
}
