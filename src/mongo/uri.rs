use crate::mongo::descriptor::ConnectionDescriptor;

pub const SCHEME: &str = "mongodb";
pub const DEFAULT_AUTH_DATABASE: &str = "admin";

/// Builds the connection URI for a descriptor.
///
/// An explicit override string is returned untouched and shadows every other
/// field. Otherwise the URI is
/// `mongodb://[user:pass@]host:port[/database][?authSource=..&ssl=true]`,
/// with only the credentials percent-encoded.
pub fn build_connection_string(descriptor: &ConnectionDescriptor) -> String {
    if let Some(uri) = descriptor.override_uri() {
        return uri.to_string();
    }

    let mut uri = format!("{SCHEME}://");

    if let Some((username, password)) = descriptor.credentials() {
        uri.push_str(&urlencoding::encode(username));
        uri.push(':');
        uri.push_str(&urlencoding::encode(password));
        uri.push('@');
    }

    uri.push_str(&descriptor.host);
    uri.push(':');
    uri.push_str(&descriptor.port.to_string());

    if let Some(database) = descriptor.database_name() {
        uri.push('/');
        uri.push_str(database);
    }

    let mut options = Vec::new();
    if let Some(auth) = descriptor.auth_database_name() {
        if auth != DEFAULT_AUTH_DATABASE {
            options.push(format!("authSource={auth}"));
        }
    }
    if descriptor.ssl {
        options.push("ssl=true".to_string());
    }

    if !options.is_empty() {
        uri.push('?');
        uri.push_str(&options.join("&"));
    }

    uri
}

/// Masks the userinfo section so a URI can be logged.
pub fn redact_credentials(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &uri[authority_start..];
    let authority_end = rest.find('/').unwrap_or(rest.len());

    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}***{}", &uri[..authority_start], &rest[at..]),
        None => uri.to_string(),
    }
}
