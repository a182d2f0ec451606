//! Server entry point.

use inotebook_server::settings::Settings;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("inotebook: {err}");
            return ExitCode::FAILURE;
        }
    };

    match inotebook_server::launch(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=server_exit module=http status=error error={err}");
            eprintln!("inotebook: {err}");
            ExitCode::FAILURE
        }
    }
}
