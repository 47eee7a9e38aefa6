use crate::driver::FormDriver;
use crate::error::{DriverError, Result};
use crate::record::QueryRecord;
use crate::submission::{PageDump, Submission};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = "Rollcall/0.1 (https://github.com/trapdoorsec/rollcall)";

fn default_timeout_secs() -> u64 {
    10
}

/// Form field names for each part of a [`QueryRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub jurisdiction: String,
    pub postal_code: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
}

/// Describes the lookup form well enough to fill and read it over plain HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSpec {
    /// Page hosting the form; the form posts back to the same URL.
    pub url: String,
    pub fields: FieldMap,
    /// Static fields posted with every submission (search mode radios, the
    /// submit button name, ...).
    #[serde(default)]
    pub extra_fields: BTreeMap<String, String>,
    /// CSS selector for the element holding the answer.
    pub result_selector: String,
    /// CSS selector for the "no match" banner, if the form has one.
    #[serde(default)]
    pub not_found_selector: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub struct HttpSession {
    client: Client,
    hidden: Vec<(String, String)>,
    last_html: String,
}

/// Generic HTML form driver over HTTP with a per-session cookie jar.
pub struct HttpFormDriver {
    url: Url,
    fields: FieldMap,
    extra_fields: BTreeMap<String, String>,
    result_selector: Selector,
    not_found_selector: Option<Selector>,
    timeout: Duration,
}

impl HttpFormDriver {
    pub fn new(form: &FormSpec) -> Result<Self> {
        let url = Url::parse(&form.url)
            .map_err(|e| DriverError::InvalidUrl(format!("{}: {}", form.url, e)))?;

        let not_found_selector = match &form.not_found_selector {
            Some(s) => Some(parse_selector(s)?),
            None => None,
        };

        Ok(Self {
            url,
            fields: form.fields.clone(),
            extra_fields: form.extra_fields.clone(),
            result_selector: parse_selector(&form.result_selector)?,
            not_found_selector,
            timeout: Duration::from_secs(form.timeout_secs),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(self.timeout)
            .connect_timeout(self.timeout / 2)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(DriverError::from)
    }

    async fn fetch_form(&self, client: &Client) -> Result<String> {
        debug!("Fetching form {}", self.url);
        let response = client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DriverError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    /// Hidden fields first, then static extras, then the record itself, so
    /// later entries win on name clashes.
    fn form_pairs(
        &self,
        hidden: &[(String, String)],
        record: &QueryRecord,
    ) -> Vec<(String, String)> {
        let mut named: BTreeMap<&str, &str> = BTreeMap::new();
        for (name, value) in hidden {
            named.insert(name, value);
        }
        for (name, value) in &self.extra_fields {
            named.insert(name, value);
        }
        named.insert(&self.fields.jurisdiction, &record.jurisdiction);
        named.insert(&self.fields.postal_code, &record.postal_code);
        named.insert(&self.fields.first_name, &record.first_name);
        named.insert(&self.fields.last_name, &record.last_name);
        named.insert(&self.fields.date_of_birth, &record.date_of_birth);

        named
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl FormDriver for HttpFormDriver {
    type Session = HttpSession;

    async fn open(&mut self) -> Result<HttpSession> {
        let client = self.build_client()?;
        let html = self.fetch_form(&client).await?;
        let hidden = hidden_fields(&html);
        info!("Opened form session at {} ({} hidden fields)", self.url, hidden.len());
        Ok(HttpSession {
            client,
            hidden,
            last_html: html,
        })
    }

    async fn submit(
        &mut self,
        session: &mut HttpSession,
        record: &QueryRecord,
    ) -> Result<Submission> {
        let pairs = self.form_pairs(&session.hidden, record);
        debug!(
            "Submitting {} fields for {} {}",
            pairs.len(),
            record.first_name,
            record.last_name
        );

        let response = session
            .client
            .post(self.url.clone())
            .form(&pairs)
            .send()
            .await?;
        let status = response.status();
        let html = response.text().await?;
        session.last_html = html;
        if !status.is_success() {
            return Err(DriverError::Status(status.as_u16()));
        }

        // Postbacks hand out fresh state tokens.
        let hidden = hidden_fields(&session.last_html);
        if !hidden.is_empty() {
            session.hidden = hidden;
        }

        interpret_response(
            &session.last_html,
            &self.result_selector,
            self.not_found_selector.as_ref(),
        )
    }

    async fn refresh(&mut self, session: &mut HttpSession) -> Result<()> {
        let html = self.fetch_form(&session.client).await?;
        session.hidden = hidden_fields(&html);
        session.last_html = html;
        Ok(())
    }

    async fn close(&mut self, session: HttpSession) {
        debug!("Closing form session ({} bytes on last page)", session.last_html.len());
        drop(session);
    }

    async fn capture_page_dump(&mut self, session: &mut HttpSession) -> Result<PageDump> {
        Ok(PageDump {
            html: session.last_html.clone(),
            screenshot: None,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| DriverError::Parse(format!("invalid selector '{}': {:?}", selector, e)))
}

/// Collect every named hidden input, in document order.
pub fn hidden_fields(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let hidden_selector = Selector::parse(r#"input[type="hidden"]"#).unwrap();

    document
        .select(&hidden_selector)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Visible text of an element, one trimmed line per text node.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn interpret_response(
    html: &str,
    result_selector: &Selector,
    not_found_selector: Option<&Selector>,
) -> Result<Submission> {
    let document = Html::parse_document(html);

    if let Some(selector) = not_found_selector
        && document
            .select(selector)
            .any(|element| !element_text(element).is_empty())
    {
        return Ok(Submission::NotFound);
    }

    let result = document
        .select(result_selector)
        .next()
        .ok_or_else(|| DriverError::MissingElement("result panel".to_string()))?;

    Ok(Submission::Text(element_text(result)))
}
