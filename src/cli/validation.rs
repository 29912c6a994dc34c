use crate::cli::args::CliArgs;
use crate::output;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid --page, pages are 1-based".to_string());
        }
    }
    if let Some(count) = args.pick {
        if count == 0 {
            return Err("invalid --pick, expected a positive count".to_string());
        }
    }
    if let Some(raw) = args.check.as_deref() {
        crate::utils::parse_id_list_csv(raw)
            .map_err(|e| format!("invalid --check '{raw}': {e}"))?;
    }
    if let Some(raw) = args.uncheck.as_deref() {
        crate::utils::parse_id_list_csv(raw)
            .map_err(|e| format!("invalid --uncheck '{raw}': {e}"))?;
    }
    if let Some(raw) = args.api_url.as_deref() {
        if reqwest::Url::parse(raw).is_err() {
            return Err(format!("invalid --api-url '{raw}'"));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected positive seconds".to_string());
        }
    }
    if let Some(rate) = args.rate {
        if rate == 0 {
            return Err("invalid --rate, expected positive pages per second".to_string());
        }
    }
    if let Some(page_ceiling) = args.page_ceiling {
        if page_ceiling == 0 {
            return Err("invalid --page-ceiling, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, or csv"
            ));
        }
    }
    Ok(())
}
