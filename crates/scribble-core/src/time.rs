/// Milliseconds since the Unix epoch, used to stamp stored drawings.
pub fn unix_millis_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_after_2020() {
        assert!(unix_millis_now() > 1_577_836_800_000);
    }
}
