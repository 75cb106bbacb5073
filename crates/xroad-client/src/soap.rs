//! SOAP client.

use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::{Map, Value};
use tracing::{debug, error, info};
use xroad_core::namespaces::{SOAP_ENV, XROAD, XROAD_PREFIX};
use xroad_core::xml::Element;
use xroad_core::{resolve_wsdl_url, AddressField, HeaderState, MemberIdentity, ObjectType};
use xroad_middleware::{BindingOptions, Interceptor, InterceptorChain, TransactionHistory, XRoadHeaderInterceptor};
use xroad_wsdl::{
    describe_input, describe_output, input_skeleton, SchemaModel, SchemaPatcher, SchemaWalker, WalkMode,
    WsdlDocument, WsdlLoader,
};

use crate::config::ClientConfig;
use crate::envelope::{body_payload, build_envelope, element_to_json, extract_fault};
use crate::error::{ClientError, ClientResult};
use crate::header::SharedHeader;
use crate::{BoxFuture, XRoadClient};

/// X-Road meta-service listing the services of a provider.
pub const LIST_METHODS: &str = "listMethods";

const SOAP_ACTION: &str = "soapaction";

/// A client for one SOAP service behind a Security Server.
///
/// Construction resolves and loads the service description (through the
/// configured cache), optionally patches it and compiles its schema. Every
/// request runs the interceptor chain; the X-Road header interceptor always
/// comes first and forces the Security Server as the endpoint.
pub struct SoapClient {
    http: reqwest::Client,
    security_server_url: String,
    header: SharedHeader,
    operation: String,
    wsdl_url: String,
    document: WsdlDocument,
    model: SchemaModel,
    chain: InterceptorChain,
    history: Arc<TransactionHistory>,
}

impl SoapClient {
    /// Builds a client from configuration.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = config.client_identity()?;
        let service = config.service_identity()?;
        let operation = service
            .service_code()
            .ok_or_else(|| ClientError::validation_with_field("service code is required", "service"))?
            .to_string();

        let cache = xroad_cache::open(&config.cache_backend()?, config.cache.ttl).await?;
        let http = reqwest::Client::builder()
            .timeout(config.security_server.timeout)
            .build()
            .map_err(|e| ClientError::configuration(format!("failed to build HTTP client: {e}")))?;

        let security_server_url = config.security_server.url.trim_end_matches('/').to_string();
        let wsdl_url = resolve_wsdl_url(&security_server_url, &service)?;
        let loader = WsdlLoader::new(http.clone()).with_optional_cache(cache);
        let mut bytes = loader.load(&wsdl_url).await?.to_vec();
        if config.client.patch_wsdl {
            bytes = SchemaPatcher::patch(&bytes, &operation)?;
        }

        let document = WsdlDocument::parse(&bytes)?;
        let model = SchemaModel::from_wsdl(&document);
        document.operation(&operation).map_err(|_| {
            ClientError::validation_with_field(
                format!("operation not found in service description: {operation}"),
                "service",
            )
        })?;

        let mut state = HeaderState::new(client.clone(), service).with_protocol_version(&config.client.protocol_version);
        if let Some(user_id) = &config.client.user_id {
            state.set_user_id(user_id.as_str());
        }

        let history = Arc::new(TransactionHistory::new());
        let mut chain = InterceptorChain::new().with(XRoadHeaderInterceptor::new(client, &security_server_url));
        chain.push(history.clone());

        info!(
            service = %state.service(),
            wsdl = %wsdl_url,
            operations = document.operations().len(),
            "soap client ready"
        );

        Ok(Self {
            http,
            security_server_url,
            header: SharedHeader::new(state),
            operation,
            wsdl_url,
            document,
            model,
            chain,
            history,
        })
    }

    /// Registers an additional interceptor after the built-in ones.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.chain.push(Arc::new(interceptor));
        self
    }

    /// The operation invoked by [`XRoadClient::request`].
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The resolved service-description URL.
    pub fn wsdl_url(&self) -> &str {
        &self.wsdl_url
    }

    /// The parsed service description.
    pub fn document(&self) -> &WsdlDocument {
        &self.document
    }

    /// Transaction id and date of the last reply.
    pub fn history(&self) -> &TransactionHistory {
        &self.history
    }

    /// Type description of the operation input.
    pub fn describe_input(&self) -> ClientResult<Value> {
        Ok(describe_input(&self.document, &self.model, &self.operation)?)
    }

    /// Type description of the operation output.
    pub fn describe_output(&self) -> ClientResult<Value> {
        Ok(describe_output(&self.document, &self.model, &self.operation)?)
    }

    /// Default payload for the operation input.
    pub fn input_skeleton(&self) -> ClientResult<Value> {
        Ok(input_skeleton(&self.document, &self.model, &self.operation)?)
    }

    /// Calls `listMethods` on the service provider and returns the advertised services.
    pub async fn list_methods(&self) -> ClientResult<Vec<MemberIdentity>> {
        let provider: Vec<&str> = self
            .header
            .service()
            .address_fields()
            .into_iter()
            .filter(|(field, _)| {
                !matches!(field, AddressField::ServiceCode | AddressField::ServiceVersion)
            })
            .map(|(_, value)| value)
            .collect();
        let meta_service = MemberIdentity::parse(
            ObjectType::Service,
            &format!("{}/{LIST_METHODS}", provider.join("/")),
        )?;

        let current = self.header.snapshot();
        let mut state = HeaderState::new(current.client().clone(), meta_service)
            .with_protocol_version(current.protocol_version());
        if let Some(user_id) = current.user_id() {
            state.set_user_id(user_id);
        }

        let envelope = Element::qualified(SOAP_ENV, "soapenv", "Envelope")
            .with_child(state.to_soap_header())
            .with_child(
                Element::qualified(SOAP_ENV, "soapenv", "Body")
                    .with_child(Element::qualified(XROAD, XROAD_PREFIX, LIST_METHODS)),
            );

        let reply = self.exchange(envelope, LIST_METHODS).await?;
        let services = body_payload(&reply)
            .filter(|payload| payload.local_name() == "listMethodsResponse")
            .map(|payload| {
                payload
                    .elements()
                    .filter(|el| el.local_name() == "service")
                    .map(MemberIdentity::from_header_element)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        debug!(count = services.len(), "listMethods returned services");
        Ok(services)
    }

    async fn call(&self, mut args: Map<String, Value>) -> ClientResult<Value> {
        let state = self.header.prepare_call(&mut args);
        let op = self.document.operation(&self.operation)?;
        let request_element = op
            .input
            .as_deref()
            .and_then(|message| self.document.message_parts(message).first())
            .and_then(|part| part.element.as_deref())
            .unwrap_or(self.operation.as_str());

        let envelope = build_envelope(&state, self.document.target_namespace(), request_element, &args);
        let reply = self.exchange(envelope, &self.operation).await?;

        let shape = op
            .output
            .as_deref()
            .and_then(|message| self.document.message_parts(message).first())
            .and_then(|part| part.element.as_deref())
            .and_then(|element| SchemaWalker::new(&self.model, WalkMode::Skeletal).walk_element(element));

        Ok(body_payload(&reply).map_or(Value::Null, |payload| element_to_json(payload, shape.as_ref())))
    }

    /// Runs egress, posts the envelope, parses the reply and runs ingress.
    async fn exchange(&self, mut envelope: Element, action: &str) -> ClientResult<Element> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml; charset=utf-8"));
        if let Ok(value) = HeaderValue::from_str(&format!("\"{action}\"")) {
            headers.insert(SOAP_ACTION, value);
        }
        let mut binding = BindingOptions {
            address: self.document.address().map(str::to_string),
        };

        self.chain.egress(&mut envelope, &mut headers, &mut binding);

        let address = binding.address.unwrap_or_else(|| self.security_server_url.clone());
        let message_id = envelope
            .child(SOAP_ENV, "Header")
            .and_then(|h| h.child(XROAD, "id"))
            .map(Element::text)
            .unwrap_or_default();
        debug!(operation = action, xroad.id = %message_id, address = %address, "sending soap request");

        let response = self
            .http
            .post(&address)
            .headers(headers)
            .body(envelope.to_document())
            .send()
            .await?;
        let status = response.status();
        let reply_headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut reply = match Element::parse_bytes(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(ClientError::transport_with_status(
                    format!("security server returned status {status}"),
                    status.as_u16(),
                ));
            }
            Err(e) => return Err(ClientError::protocol(format!("invalid SOAP reply: {e}"))),
        };

        self.chain.ingress(&mut reply, &reply_headers);

        if let Some(fault) = extract_fault(&reply) {
            error!(
                operation = action,
                xroad.id = %message_id,
                code = %fault.code,
                message = %fault.message,
                "remote fault"
            );
            return Err(ClientError::RemoteFault {
                code: fault.code,
                message: fault.message,
                detail: fault.detail,
            });
        }

        if !status.is_success() {
            return Err(ClientError::transport_with_status(
                format!("security server returned status {status}"),
                status.as_u16(),
            ));
        }

        Ok(reply)
    }
}

impl XRoadClient for SoapClient {
    fn header(&self) -> &SharedHeader {
        &self.header
    }

    fn request<'a>(&'a self, args: Map<String, Value>) -> BoxFuture<'a, ClientResult<Value>> {
        Box::pin(self.call(args))
    }
}

impl std::fmt::Debug for SoapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapClient")
            .field("security_server_url", &self.security_server_url)
            .field("operation", &self.operation)
            .field("wsdl_url", &self.wsdl_url)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}
