//! vCard 3.0 text assembly.
//!
//! One implementation, two call sites: the explicit "download contact file"
//! export and the QR `auto-vcard` payload. They must never drift into two
//! different vCard formats, so both go through [`to_vcard`].

use crate::document::{CardDocument, StaticPlatform, keys};

/// Escape a text value per vCard 3.0 (backslash, newline, comma, semicolon).
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Canonical profile URL for a social link value.
///
/// Values that are already URLs pass through; bare handles get the
/// platform's canonical prefix.
pub fn profile_url(platform: &str, value: &str) -> String {
    let handle = value.trim().trim_start_matches('@');
    if handle.starts_with("http://") || handle.starts_with("https://") {
        return handle.to_string();
    }
    match platform {
        "instagram" => format!("https://instagram.com/{handle}"),
        "twitter" | "x" => format!("https://x.com/{handle}"),
        "tiktok" => format!("https://tiktok.com/@{handle}"),
        "youtube" => format!("https://youtube.com/@{handle}"),
        "github" => format!("https://github.com/{handle}"),
        "telegram" => format!("https://t.me/{handle}"),
        "facebook" => format!("https://facebook.com/{handle}"),
        "linkedin" => format!("https://linkedin.com/in/{handle}"),
        _ => handle.to_string(),
    }
}

/// Assemble a deterministic vCard 3.0 payload from a card document.
///
/// Sources: `fields.name`, `fields.tagline`, the static email/website
/// channels, every non-empty phone (first marked preferred), and every
/// non-empty social link as a typed profile line. Field order is fixed so
/// the output is byte-stable for identical documents.
pub fn to_vcard(doc: &CardDocument) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("BEGIN:VCARD".into());
    lines.push("VERSION:3.0".into());

    let name = doc.text(keys::NAME).trim().to_string();
    lines.push(format!("N:{};;;;", escape(&name)));
    lines.push(format!("FN:{}", escape(&name)));

    let tagline = doc.text(keys::TAGLINE).trim();
    if !tagline.is_empty() {
        lines.push(format!("TITLE:{}", escape(tagline)));
    }

    for (i, phone) in doc
        .phones
        .iter()
        .filter(|p| !p.value.trim().is_empty())
        .enumerate()
    {
        let kind = if i == 0 { "CELL,PREF" } else { "CELL" };
        lines.push(format!("TEL;TYPE={kind}:{}", escape(phone.value.trim())));
    }

    let email = doc.static_social_value(StaticPlatform::Email).trim();
    if !email.is_empty() {
        lines.push(format!("EMAIL;TYPE=INTERNET:{}", escape(email)));
    }
    let website = doc.static_social_value(StaticPlatform::Website).trim();
    if !website.is_empty() {
        lines.push(format!("URL:{}", escape(website)));
    }

    for link in doc
        .social_links
        .iter()
        .filter(|l| !l.value.trim().is_empty())
    {
        lines.push(format!(
            "X-SOCIALPROFILE;TYPE={}:{}",
            link.platform,
            profile_url(&link.platform, &link.value)
        ));
    }

    lines.push("END:VCARD".into());
    // vCard lines end with CRLF, including the last.
    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Face, Offset, PhoneEntry, SocialEntry, StableId};
    use pretty_assertions::assert_eq;

    fn fixture() -> CardDocument {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::NAME, "Ada Lovelace");
        doc.set_text(keys::TAGLINE, "Analyst; Programmer");
        doc.static_social.get_mut(&StaticPlatform::Email).unwrap().value =
            "ada@example.com".into();
        doc.static_social
            .get_mut(&StaticPlatform::Website)
            .unwrap()
            .value = "https://ada.example".into();
        doc.phones.push(PhoneEntry {
            id: StableId::test("p1"),
            value: "+44 20 7946 0321".into(),
            placement: Face::Front,
            position: Offset::ZERO,
        });
        doc.phones.push(PhoneEntry {
            id: StableId::test("p2"),
            value: "+44 20 7946 0999".into(),
            placement: Face::Back,
            position: Offset::ZERO,
        });
        doc.social_links.push(SocialEntry {
            id: StableId::test("s1"),
            platform: "github".into(),
            value: "adalovelace".into(),
            placement: Face::Back,
            position: Offset::ZERO,
            style_override: None,
        });
        doc
    }

    #[test]
    fn test_vcard_structure() {
        let vcf = to_vcard(&fixture());
        assert!(vcf.starts_with("BEGIN:VCARD\r\nVERSION:3.0\r\n"));
        assert!(vcf.ends_with("END:VCARD\r\n"));
        assert!(vcf.contains("FN:Ada Lovelace\r\n"));
        assert!(vcf.contains("TITLE:Analyst\\; Programmer\r\n"));
    }

    #[test]
    fn test_first_phone_is_preferred() {
        let vcf = to_vcard(&fixture());
        assert!(vcf.contains("TEL;TYPE=CELL,PREF:+44 20 7946 0321\r\n"));
        assert!(vcf.contains("TEL;TYPE=CELL:+44 20 7946 0999\r\n"));
    }

    #[test]
    fn test_social_links_emit_typed_urls() {
        let vcf = to_vcard(&fixture());
        assert!(vcf.contains("X-SOCIALPROFILE;TYPE=github:https://github.com/adalovelace\r\n"));
    }

    #[test]
    fn test_empty_channels_are_omitted() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::NAME, "Solo");
        doc.set_text(keys::TAGLINE, "");
        let vcf = to_vcard(&doc);
        assert!(!vcf.contains("TITLE:"));
        assert!(!vcf.contains("TEL;"));
        assert!(!vcf.contains("EMAIL"));
    }

    #[test]
    fn test_deterministic_output() {
        assert_eq!(to_vcard(&fixture()), to_vcard(&fixture()));
    }

    #[test]
    fn test_profile_url_passthrough_and_prefix() {
        assert_eq!(
            profile_url("instagram", "@ada.codes"),
            "https://instagram.com/ada.codes"
        );
        assert_eq!(
            profile_url("instagram", "https://instagram.com/ada.codes"),
            "https://instagram.com/ada.codes"
        );
    }
}
