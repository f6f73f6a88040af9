fn main() {
    if let Err(err) = survey_harmonize::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
