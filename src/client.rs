// File: ./src/client.rs
// CalDAV event source
use crate::error::{CalendarError, Result};
use crate::model::EventRecord;
use crate::source::{EventFilter, EventSource};

// Libdav imports
use libdav::CalDavClient;
use libdav::caldav::{FindCalendarHomeSet, FindCalendars, GetCalendarResources};
use libdav::dav::{ListResources, WebDavClient};

use async_trait::async_trait;
use chrono::FixedOffset;
use futures::stream::{self, StreamExt};
use http::Uri;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use tower_http::auth::AddAuthorization;
use tracing::{debug, warn};

type HttpsClient = AddAuthorization<
    Client<
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
        String,
    >,
>;

#[derive(Clone, Debug)]
pub struct CalDavSource {
    client: CalDavClient<HttpsClient>,
    calendars: Vec<String>,
    zone: FixedOffset,
}

impl CalDavSource {
    /// `calendars` are collection hrefs; when empty they are discovered from
    /// the server on every fetch.
    pub fn new(
        url: &str,
        user: &str,
        pass: &str,
        insecure: bool,
        calendars: Vec<String>,
        zone: FixedOffset,
    ) -> Result<Self> {
        if url.is_empty() {
            return Err(CalendarError::Config("no CalDAV url configured".to_string()));
        }

        let uri: Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| CalendarError::Config(e.to_string()))?;

        let https_connector = if insecure {
            let tls_config = rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth();

            HttpsConnectorBuilder::new()
                .with_tls_config(tls_config)
                .https_or_http()
                .enable_http1()
                .build()
        } else {
            let mut root_store = rustls::RootCertStore::empty();
            let result = rustls_native_certs::load_native_certs();
            root_store.add_parsable_certificates(result.certs);

            if root_store.is_empty() {
                return Err(CalendarError::Config(
                    "No valid system certificates found.".to_string(),
                ));
            }

            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();

            HttpsConnectorBuilder::new()
                .with_tls_config(tls_config)
                .https_or_http()
                .enable_http1()
                .build()
        };

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let auth_client = AddAuthorization::basic(http_client, user, pass);
        let webdav = WebDavClient::new(uri, auth_client);

        Ok(Self {
            client: CalDavClient::new(webdav),
            calendars,
            zone,
        })
    }

    /// Configured collections, or whatever the server advertises.
    pub async fn calendar_hrefs(&self) -> Result<Vec<String>> {
        if !self.calendars.is_empty() {
            return Ok(self.calendars.clone());
        }
        let client = &self.client;
        let base_path = client.base_url().path().to_string();

        // 1. The base path may already be a calendar
        if let Ok(response) = client.request(ListResources::new(&base_path)).await
            && response.resources.iter().any(|r| r.href.ends_with(".ics"))
        {
            return Ok(vec![base_path]);
        }

        // 2. CalDAV discovery
        let principal = client
            .find_current_user_principal()
            .await
            .map_err(|e| CalendarError::Source(format!("{:?}", e)))?
            .ok_or_else(|| CalendarError::Source("No principal".to_string()))?;
        let home_set_resp = client
            .request(FindCalendarHomeSet::new(principal.path()))
            .await
            .map_err(|e| CalendarError::Source(format!("{:?}", e)))?;
        let home_url = home_set_resp
            .home_sets
            .first()
            .ok_or_else(|| CalendarError::Source("No home set".to_string()))?;
        let cals_resp = client
            .request(FindCalendars::new(home_url.path()))
            .await
            .map_err(|e| CalendarError::Source(format!("{:?}", e)))?;

        Ok(cals_resp.calendars.into_iter().map(|c| c.href).collect())
    }

    /// Every event of one collection.
    pub async fn get_events(&self, calendar_href: &str) -> Result<Vec<EventRecord>> {
        let client = &self.client;
        let list_resp = client
            .request(ListResources::new(calendar_href))
            .await
            .map_err(|e| CalendarError::Source(format!("PROPFIND: {:?}", e)))?;

        let hrefs: Vec<String> = list_resp
            .resources
            .into_iter()
            .map(|r| r.href)
            .filter(|href| href.ends_with(".ics"))
            .collect();
        if hrefs.is_empty() {
            return Ok(vec![]);
        }

        let fetched_resp = client
            .request(GetCalendarResources::new(calendar_href).with_hrefs(hrefs))
            .await
            .map_err(|e| CalendarError::Source(format!("MULTIGET: {:?}", e)))?;

        let mut events = Vec::new();
        for item in fetched_resp.resources {
            let Ok(content) = item.content else {
                warn!(href = %item.href, "resource missing from multiget response");
                continue;
            };
            match EventRecord::from_ics(&content.data, self.zone) {
                Ok(records) => events.extend(records),
                // VTODOs and journals live in the same collections
                Err(e) => debug!(href = %item.href, error = %e, "skipping resource"),
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl EventSource for CalDavSource {
    async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>> {
        let hrefs = self.calendar_hrefs().await?;
        let futures = hrefs.into_iter().map(|href| {
            let source = self.clone();
            async move { source.get_events(&href).await }
        });
        let mut stream = stream::iter(futures).buffer_unordered(4);

        let mut all = Vec::new();
        while let Some(res) = stream.next().await {
            all.extend(res?);
        }
        let total = all.len();
        let matching = filter.apply(all);
        debug!(total, matching = matching.len(), "fetched CalDAV events");
        Ok(matching)
    }
}

#[derive(Debug)]
struct NoVerifier;
impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &[rustls::pki_types::CertificateDer<'_>],
        _: &rustls::pki_types::ServerName<'_>,
        _: &[u8],
        _: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }
    fn verify_tls12_signature(
        &self,
        _: &[u8],
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn verify_tls13_signature(
        &self,
        _: &[u8],
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme::*;
        vec![
            RSA_PKCS1_SHA256,
            RSA_PKCS1_SHA384,
            RSA_PKCS1_SHA512,
            ECDSA_NISTP256_SHA256,
            RSA_PSS_SHA256,
            ED25519,
        ]
    }
}
