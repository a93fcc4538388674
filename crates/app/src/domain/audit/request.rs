//! Request Context

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const CLIENT_IP: &str = "x-client-ip";
const USER_AGENT: &str = "user-agent";

/// Client details captured alongside an audit record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Extract client details from request headers. Header names are matched
    /// case-insensitively.
    ///
    /// The client IP is the first non-empty of `X-Forwarded-For` (its first
    /// entry), `X-Real-IP` and `X-Client-IP`.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut forwarded_for = None;
        let mut real_ip = None;
        let mut client_ip = None;
        let mut user_agent = None;

        for (name, value) in headers {
            let slot = if name.eq_ignore_ascii_case(FORWARDED_FOR) {
                &mut forwarded_for
            } else if name.eq_ignore_ascii_case(REAL_IP) {
                &mut real_ip
            } else if name.eq_ignore_ascii_case(CLIENT_IP) {
                &mut client_ip
            } else if name.eq_ignore_ascii_case(USER_AGENT) {
                &mut user_agent
            } else {
                continue;
            };

            if slot.is_none() {
                *slot = Some(value);
            }
        }

        let forwarded_for = forwarded_for
            .and_then(|value| value.split(',').next())
            .and_then(non_empty);

        Self {
            ip_address: forwarded_for
                .or_else(|| real_ip.and_then(non_empty))
                .or_else(|| client_ip.and_then(non_empty)),
            user_agent: user_agent.and_then(non_empty),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();

    (!value.is_empty()).then(|| value.to_string())
}
