/// Plausibility check for a recipient address.
///
/// Accepts `local@domain.tld`-shaped strings: non-empty local part, exactly
/// one `@`, a dot inside the domain and no whitespace. Deliverability is the
/// SMTP server's business.
pub fn is_plausible_address(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.find('.') {
        Some(dot) => dot > 0 && !domain.ends_with('.'),
        None => false,
    }
}
