#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = tracevis_cli::run_from_env() {
        eprintln!("tracevis: {error}");
        std::process::exit(error.exit_code());
    }
}
