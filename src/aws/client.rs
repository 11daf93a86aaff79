//! Remote query surface
//!
//! `ResourceClient` hands out a `QueryHandle` bound to one service, profile
//! and region. The production client shells out to the AWS CLI; tests swap
//! in a canned client.

use crate::config::schema::AwsConfig;
use crate::error::{AwsmapError, AwsmapResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Filter name to accepted values
pub type Filters = BTreeMap<String, Vec<String>>;

/// Build a single `Name`/`Values` filter
pub fn filter(name: &str, value: &str) -> Filters {
    let mut filters = Filters::new();
    filters.insert(name.to_string(), vec![value.to_string()]);
    filters
}

/// Query handle bound to a service, credential profile and region
#[async_trait]
pub trait QueryHandle: Send + Sync {
    /// Credential profile this handle queries with
    fn profile(&self) -> &str;

    /// Region this handle queries in
    fn region(&self) -> &str;

    /// Run a describe-style operation and return the full response envelope.
    ///
    /// Paginated collections are concatenated across pages.
    async fn describe(&self, operation: &str, filters: &Filters) -> AwsmapResult<Value>;
}

/// Factory for query handles
pub trait ResourceClient: Send + Sync {
    fn query(&self, service: &str, profile: &str, region: &str) -> Box<dyn QueryHandle>;
}

/// Operations that reject `--max-items`
const UNPAGINATED: &[&str] = &["get-caller-identity", "describe-vpn-gateways"];

/// Stderr markers of credential or permission failures
const ACCESS_DENIED_MARKERS: &[&str] = &[
    "AccessDenied",
    "UnauthorizedOperation",
    "AuthFailure",
    "ExpiredToken",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "Unable to locate credentials",
    "could not be found",
];

/// Client backed by the `aws` command line tool
#[derive(Debug, Clone)]
pub struct AwsCli {
    binary: String,
    page_size: u32,
}

impl AwsCli {
    pub fn new(binary: impl Into<String>, page_size: u32) -> Self {
        Self {
            binary: binary.into(),
            page_size: page_size.max(1),
        }
    }

    pub fn from_config(config: &AwsConfig) -> Self {
        Self::new(config.cli_path.clone(), config.page_size)
    }
}

impl ResourceClient for AwsCli {
    fn query(&self, service: &str, profile: &str, region: &str) -> Box<dyn QueryHandle> {
        Box::new(AwsCliQuery {
            binary: self.binary.clone(),
            service: service.to_string(),
            profile: profile.to_string(),
            region: region.to_string(),
            page_size: self.page_size,
        })
    }
}

struct AwsCliQuery {
    binary: String,
    service: String,
    profile: String,
    region: String,
    page_size: u32,
}

impl AwsCliQuery {
    fn label(&self, operation: &str) -> String {
        format!("{} {}", self.service, operation)
    }

    fn build_args(&self, operation: &str, filters: &Filters, token: Option<&str>) -> Vec<String> {
        let mut args = vec![
            self.service.clone(),
            operation.to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--profile".to_string(),
            self.profile.clone(),
            "--region".to_string(),
            self.region.clone(),
        ];

        if !filters.is_empty() {
            let spec: Vec<Value> = filters
                .iter()
                .map(|(name, values)| json!({"Name": name, "Values": values}))
                .collect();
            args.push("--filters".to_string());
            args.push(Value::Array(spec).to_string());
        }

        if !UNPAGINATED.contains(&operation) {
            args.push("--max-items".to_string());
            args.push(self.page_size.to_string());
            if let Some(token) = token {
                args.push("--starting-token".to_string());
                args.push(token.to_string());
            }
        }

        args
    }

    async fn exec(&self, operation: &str, args: &[String]) -> AwsmapResult<Map<String, Value>> {
        debug!("Executing: {} {:?}", self.binary, args);

        let output = Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    AwsmapError::AwsCliNotFound
                } else {
                    AwsmapError::command_failed(format!("{} {}", self.binary, self.label(operation)), e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&self.label(operation), &stderr));
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(AwsmapError::remote_call(self.label(operation), "empty response"));
        }

        match serde_json::from_slice(&output.stdout) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AwsmapError::remote_call(
                self.label(operation),
                "response is not a JSON object",
            )),
            Err(e) => Err(AwsmapError::remote_call(
                self.label(operation),
                format!("unparseable response: {}", e),
            )),
        }
    }
}

#[async_trait]
impl QueryHandle for AwsCliQuery {
    fn profile(&self) -> &str {
        &self.profile
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn describe(&self, operation: &str, filters: &Filters) -> AwsmapResult<Value> {
        let mut envelope: Option<Map<String, Value>> = None;
        let mut token: Option<String> = None;

        loop {
            let args = self.build_args(operation, filters, token.as_deref());
            let mut page = self.exec(operation, &args).await?;

            let next = page
                .remove("NextToken")
                .and_then(|t| t.as_str().map(str::to_string));
            merge_page(&mut envelope, page);

            match next {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    warn!("{} returned the same page token twice, stopping", self.label(operation));
                    break;
                }
                Some(next) => {
                    debug!("{}: fetching next page", self.label(operation));
                    token = Some(next);
                }
                None => break,
            }
        }

        Ok(Value::Object(envelope.unwrap_or_default()))
    }
}

/// Fold one page into the accumulated envelope, concatenating collections
fn merge_page(acc: &mut Option<Map<String, Value>>, page: Map<String, Value>) {
    match acc {
        None => *acc = Some(page),
        Some(acc) => {
            for (field, value) in page {
                match acc.get_mut(&field) {
                    Some(Value::Array(existing)) => {
                        if let Value::Array(more) = value {
                            existing.extend(more);
                        }
                    }
                    Some(_) => {}
                    None => {
                        acc.insert(field, value);
                    }
                }
            }
        }
    }
}

/// Map a failed CLI call onto the error taxonomy
fn classify_failure(operation: &str, stderr: &str) -> AwsmapError {
    if ACCESS_DENIED_MARKERS.iter().any(|m| stderr.contains(m)) {
        AwsmapError::RemoteAccessDenied {
            operation: operation.to_string(),
            message: stderr.trim().to_string(),
        }
    } else {
        AwsmapError::remote_call(operation, stderr.trim())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> AwsCliQuery {
        AwsCliQuery {
            binary: "aws".to_string(),
            service: "ec2".to_string(),
            profile: "prod".to_string(),
            region: "eu-west-1".to_string(),
            page_size: 50,
        }
    }

    #[test]
    fn args_carry_profile_region_and_json_filters() {
        let args = query().build_args("describe-subnets", &filter("vpc-id", "vpc-1"), None);

        assert_eq!(&args[..2], ["ec2", "describe-subnets"]);
        assert!(args.windows(2).any(|w| w == ["--profile", "prod"]));
        assert!(args.windows(2).any(|w| w == ["--region", "eu-west-1"]));
        assert!(args.windows(2).any(|w| w == ["--output", "json"]));

        let pos = args.iter().position(|a| a == "--filters").unwrap();
        let spec: Value = serde_json::from_str(&args[pos + 1]).unwrap();
        assert_eq!(spec, json!([{"Name": "vpc-id", "Values": ["vpc-1"]}]));
        assert!(args.windows(2).any(|w| w == ["--max-items", "50"]));
    }

    #[test]
    fn args_include_starting_token() {
        let args = query().build_args("describe-vpcs", &Filters::new(), Some("tok-2"));
        assert!(!args.contains(&"--filters".to_string()));
        assert!(args.windows(2).any(|w| w == ["--starting-token", "tok-2"]));
    }

    #[test]
    fn unpaginated_operations_skip_max_items() {
        let args = query().build_args("describe-vpn-gateways", &Filters::new(), Some("tok"));
        assert!(!args.contains(&"--max-items".to_string()));
        assert!(!args.contains(&"--starting-token".to_string()));
    }

    #[test]
    fn merge_concatenates_collections() {
        let mut acc = None;
        let first = json!({"Subnets": [{"SubnetId": "a"}], "Meta": 1});
        let second = json!({"Subnets": [{"SubnetId": "b"}], "Meta": 2});
        merge_page(&mut acc, first.as_object().unwrap().clone());
        merge_page(&mut acc, second.as_object().unwrap().clone());

        let merged = Value::Object(acc.unwrap());
        assert_eq!(merged["Subnets"], json!([{"SubnetId": "a"}, {"SubnetId": "b"}]));
        assert_eq!(merged["Meta"], json!(1));
    }

    #[test]
    fn access_denied_is_classified() {
        let err = classify_failure(
            "ec2 describe-vpcs",
            "An error occurred (UnauthorizedOperation) when calling the DescribeVpcs operation",
        );
        assert!(err.is_access_denied());

        let err = classify_failure("sts get-caller-identity", "Unable to locate credentials.");
        assert!(err.is_access_denied());

        let err = classify_failure(
            "ec2 describe-vpcs",
            "The config profile (nope) could not be found",
        );
        assert!(err.is_access_denied());
    }

    #[test]
    fn other_failures_are_remote_call_errors() {
        let err = classify_failure("ec2 describe-vpcs", "Could not connect to the endpoint URL");
        assert!(matches!(err, AwsmapError::RemoteCall { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_output_is_a_remote_call_error() {
        // `true` ignores its arguments and prints nothing
        let client = AwsCli::new("true", 10);
        let err = client
            .query("ec2", "default", "us-east-1")
            .describe("describe-vpcs", &Filters::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AwsmapError::RemoteCall { ref stderr, .. } if stderr == "empty response"));
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let client = AwsCli::new("awsmap-test-no-such-binary", 10);
        let handle = client.query("ec2", "default", "us-east-1");
        assert_eq!(handle.profile(), "default");
        assert_eq!(handle.region(), "us-east-1");

        let err = handle.describe("describe-vpcs", &Filters::new()).await.unwrap_err();
        assert!(matches!(err, AwsmapError::AwsCliNotFound));
    }
}
