//! User-agent classification for session device/browser breakdowns

use woothee::parser::Parser;

pub struct UaInfo {
    pub device: String,
    pub browser: String,
}

/// Classify a raw user-agent string into (device class, browser name)
pub fn classify_user_agent(ua: &str) -> UaInfo {
    let parser = Parser::new();

    match parser.parse(ua) {
        Some(result) => {
            let device = match result.category {
                "pc" => "desktop",
                "smartphone" | "mobilephone" => "mobile",
                "crawler" => "bot",
                "appliance" => "appliance",
                _ => "unknown",
            };
            let browser = if result.name.is_empty() || result.name == "UNKNOWN" {
                "Unknown".to_string()
            } else {
                result.name.to_string()
            };
            UaInfo {
                device: device.to_string(),
                browser,
            }
        }
        None => UaInfo {
            device: "unknown".to_string(),
            browser: "Unknown".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_desktop_chrome() {
        let info = classify_user_agent(CHROME_DESKTOP);
        assert_eq!(info.device, "desktop");
        assert_eq!(info.browser, "Chrome");
    }

    #[test]
    fn test_mobile_safari() {
        let info = classify_user_agent(SAFARI_IPHONE);
        assert_eq!(info.device, "mobile");
        assert_eq!(info.browser, "Safari");
    }

    #[test]
    fn test_garbage_is_unknown() {
        let info = classify_user_agent("definitely-not-a-browser/0.0");
        assert_eq!(info.device, "unknown");
    }
}
