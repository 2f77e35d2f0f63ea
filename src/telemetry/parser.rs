use crate::telemetry::types::TelemetryFrame;

/// Prefix identifying a battery status record
/// Format: +BATCG=[id],[percentage],[n],[charge-code],[n],[n]
pub const MARKER: &str = "+BATCG=";

/// Parse one raw serial record into a telemetry frame.
///
/// The marker may appear anywhere in the line. Both the percentage and the
/// charge-state code must be present, otherwise nothing is produced.
pub fn parse(line: &[u8]) -> Option<TelemetryFrame> {
    let text = std::str::from_utf8(line).ok()?;

    let percentage = find_percentage(text)?;
    let charge_code = find_charge_code(text)?;

    let percentage = percentage.parse::<u32>().ok()?;
    Some(TelemetryFrame::new(percentage, charge_code))
}

/// Text following each occurrence of the marker
fn records(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices(MARKER)
        .map(move |(idx, _)| &text[idx + MARKER.len()..])
}

fn find_percentage(text: &str) -> Option<&str> {
    records(text).find_map(|rest| {
        let (id, rest) = rest.split_once(',')?;
        let (percentage, _) = rest.split_once(',')?;
        (is_digits(id) && is_digits(percentage)).then_some(percentage)
    })
}

fn find_charge_code(text: &str) -> Option<&str> {
    records(text).find_map(|rest| {
        let rest = skip_number_field(rest)?;
        let rest = skip_number_field(rest)?;
        let rest = skip_number_field(rest)?;

        // The leading character may be anything but a line break, the separator included
        let lead = rest.chars().next().filter(|&c| c != '\n')?;
        let code_len = lead.len_utf8() + digit_run(&rest[lead.len_utf8()..]);
        let (code, tail) = rest.split_at(code_len);

        let tail = skip_number_field(tail.strip_prefix(',')?)?;
        (digit_run(tail) > 0).then_some(code)
    })
}

/// Remainder after a `<digits>,` field, if the text starts with one
fn skip_number_field(s: &str) -> Option<&str> {
    let digits = digit_run(s);
    if digits == 0 {
        return None;
    }
    s[digits..].strip_prefix(',')
}

fn digit_run(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
