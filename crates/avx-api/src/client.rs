// Controller API HTTP client
//
// Wraps `reqwest::Client` with the controller's single action-dispatch
// endpoint, session stamping, and envelope checking. Resource clients
// (tags, devices, gateways) borrow a `ControllerClient` and live in
// separate files to keep this module focused on transport mechanics.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, trace};
use url::Url;

use crate::auth::{API_PATH, LOGIN_ACTION, Session};
use crate::devices::DeviceClient;
use crate::error::Error;
use crate::gateways::GatewayClient;
use crate::models::{ApiResponse, LoginResponse};
use crate::tags::TagClient;
use crate::transport::TransportConfig;

/// Request fields every call carries, followed by the call's own parameters.
#[derive(Serialize)]
struct Stamped<'a, P: ?Sized> {
    action: &'a str,
    #[serde(rename = "CID")]
    cid: &'a str,
    #[serde(flatten)]
    params: &'a P,
}

/// Raw HTTP client for the controller API.
///
/// Owns the session obtained at login. All methods return the decoded
/// `results` payload; the `{return, reason}` envelope is checked and
/// stripped before the caller sees it.
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    api_url: Url,
    session: Session,
}

impl std::fmt::Debug for ControllerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ControllerClient {
    /// Log in with username/password and return a client bound to the new session.
    ///
    /// `POST /v1/api` with `action=login`. The `base_url` is the controller
    /// root (e.g. `https://controller.example.com`).
    pub async fn login(
        base_url: Url,
        username: &str,
        password: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let api_url = api_url(&base_url)?;

        debug!(%api_url, username, "logging in");

        let form = [
            ("action", LOGIN_ACTION),
            ("username", username),
            ("password", password.expose_secret()),
        ];
        let resp = http
            .post(api_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let login: LoginResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            }
        })?;

        match (login.ok, login.cid) {
            (true, Some(cid)) if !cid.is_empty() => {
                debug!("login successful");
                Ok(Self {
                    http,
                    base_url,
                    api_url,
                    session: Session::new(cid),
                })
            }
            (true, _) => Err(Error::Authentication {
                message: "login response did not include a CID".into(),
            }),
            (false, _) => Err(Error::Authentication {
                message: login.reason.unwrap_or_else(|| "login rejected".into()),
            }),
        }
    }

    /// Create a client from a pre-built `reqwest::Client` and an existing session.
    pub fn with_session(
        http: reqwest::Client,
        base_url: Url,
        session: Session,
    ) -> Result<Self, Error> {
        let api_url = api_url(&base_url)?;
        Ok(Self {
            http,
            base_url,
            api_url,
            session,
        })
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── Resource clients ─────────────────────────────────────────────

    pub fn tags(&self) -> TagClient<'_> {
        TagClient::new(self)
    }

    pub fn devices(&self) -> DeviceClient<'_> {
        DeviceClient::new(self)
    }

    pub fn gateways(&self) -> GatewayClient<'_> {
        GatewayClient::new(self)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a form-encoded POST and check the envelope. The payload, if any, is discarded.
    pub(crate) async fn post<P>(&self, action: &str, params: &P) -> Result<(), Error>
    where
        P: Serialize + ?Sized,
    {
        debug!(action, "POST {}", self.api_url);

        let body = self.stamp(action, params);
        let resp = self
            .http
            .post(self.api_url.clone())
            .form(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let _: Option<IgnoredAny> = check_envelope(action, resp).await?;
        Ok(())
    }

    /// Send a multipart POST: the params as text parts plus one file part.
    ///
    /// Used for uploads such as a device's private key.
    pub(crate) async fn post_multipart<P>(
        &self,
        action: &str,
        params: &P,
        file_field: &str,
        path: &Path,
    ) -> Result<(), Error>
    where
        P: Serialize + ?Sized,
    {
        debug!(action, file = %path.display(), "POST (multipart) {}", self.api_url);

        let mut form = reqwest::multipart::Form::new();
        for (key, value) in form_fields(&self.stamp(action, params))? {
            form = form.text(key, value);
        }

        let contents = tokio::fs::read(path).await.map_err(|source| Error::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| file_field.to_owned(), |n| n.to_string_lossy().into_owned());
        form = form.part(
            file_field.to_owned(),
            reqwest::multipart::Part::bytes(contents).file_name(file_name),
        );

        let resp = self
            .http
            .post(self.api_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let _: Option<IgnoredAny> = check_envelope(action, resp).await?;
        Ok(())
    }

    /// Send a GET with the params as the query string and return the decoded `results`.
    ///
    /// `Ok(None)` means the controller accepted the call but sent no `results`.
    pub(crate) async fn get<T, P>(&self, action: &str, params: &P) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        debug!(action, "GET {}", self.api_url);

        let query = self.stamp(action, params);
        let resp = self
            .http
            .get(self.api_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_envelope(action, resp).await
    }

    fn stamp<'a, P: ?Sized>(&'a self, action: &'a str, params: &'a P) -> Stamped<'a, P> {
        Stamped {
            action,
            cid: self.session.cid(),
            params,
        }
    }
}

/// Success predicate shared by every call.
///
/// A 2xx response whose body decodes as the envelope with `return: true`
/// passes. `return: false` becomes `Error::Api` with the reason verbatim.
async fn check_envelope<T: DeserializeOwned>(
    action: &str,
    resp: reqwest::Response,
) -> Result<Option<T>, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "session expired or invalid credentials".into(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            message: preview(&body).to_owned(),
        });
    }

    trace!(action, body = %preview(&body), "response");

    let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        }
    })?;

    if envelope.ok {
        Ok(envelope.results)
    } else {
        Err(Error::Api {
            action: action.to_owned(),
            reason: envelope.reason.unwrap_or_default(),
        })
    }
}

fn api_url(base_url: &Url) -> Result<Url, Error> {
    let base = base_url.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{API_PATH}"))?)
}

/// Flatten a parameter struct into `(name, value)` text fields.
///
/// Mirrors form encoding: strings verbatim, numbers and booleans in their
/// display form, `null` fields dropped.
fn form_fields<T: Serialize>(value: &T) -> Result<Vec<(String, String)>, Error> {
    let value = serde_json::to_value(value).map_err(|e| Error::Encoding(e.to_string()))?;
    let serde_json::Value::Object(map) = value else {
        return Err(Error::Encoding("parameters must be a struct or map".into()));
    };
    let mut fields = Vec::with_capacity(map.len());
    for (key, value) in map {
        let text = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s,
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                return Err(Error::Encoding(format!("field '{key}' is not a scalar: {other}")));
            }
        };
        fields.push((key, text));
    }
    Ok(fields)
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
