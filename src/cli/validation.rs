use crate::cli::args::CliArgs;

pub fn parse_filter_arg(raw: &str) -> Result<(String, String), String> {
    let (category, option) = raw
        .split_once('=')
        .ok_or_else(|| "expected CATEGORY=OPTION".to_string())?;
    let category = category.trim();
    let option = option.trim();
    if category.is_empty() || option.is_empty() {
        return Err("expected CATEGORY=OPTION".to_string());
    }
    Ok((category.to_string(), option.to_string()))
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    for raw in args.filter.iter() {
        parse_filter_arg(raw).map_err(|e| format!("invalid --filter '{raw}': {e}"))?;
    }
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or html"
            ));
        }
    }
    if let Some(raw) = args.header.as_deref() {
        crate::client::parse_header(raw).map_err(|e| e.to_string())?;
    }
    Ok(())
}
