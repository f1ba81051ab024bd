//! CloudFormation intrinsic functions
//!
//! Each helper returns the JSON form CloudFormation expects, ready to be
//! embedded in resource properties.

use serde_json::{Value, json};

pub const AWS_PARTITION: &str = "AWS::Partition";
pub const AWS_REGION: &str = "AWS::Region";
pub const AWS_ACCOUNT_ID: &str = "AWS::AccountId";

/// `{ "Ref": id }`
pub fn fn_ref(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{ "Fn::GetAtt": [id, attribute] }`
pub fn fn_get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{ "Fn::Join": [delimiter, parts] }`
pub fn fn_join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

/// `{ "Fn::Select": [index, list] }`
pub fn fn_select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index, list] })
}

/// `{ "Fn::GetAZs": region }`, empty region meaning the stack's region
pub fn fn_get_azs(region: &str) -> Value {
    json!({ "Fn::GetAZs": region })
}

/// The availability zone at `index` in the deployment region
pub fn availability_zone(index: u8) -> Value {
    fn_select(index as usize, fn_get_azs(""))
}

/// ARN of an account's root principal, partition-aware
pub fn account_root_arn(account_id: &str) -> Value {
    fn_join(
        "",
        vec![
            Value::from("arn:"),
            fn_ref(AWS_PARTITION),
            Value::from(format!(":iam::{}:root", account_id)),
        ],
    )
}

/// Logical id referenced by a `Ref` or `Fn::GetAtt` expression, if `value`
/// is one
pub fn referenced_id(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    if let Some(Value::String(id)) = map.get("Ref") {
        return Some(id);
    }
    map.get("Fn::GetAtt")
        .and_then(|v| v.as_array())
        .and_then(|parts| parts.first())
        .and_then(|id| id.as_str())
}

/// Whether a `Ref` target is a pseudo parameter such as `AWS::Region`
pub fn is_pseudo_parameter(id: &str) -> bool {
    id.starts_with("AWS::")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forms() {
        assert_eq!(fn_ref("Vpc"), json!({"Ref": "Vpc"}));
        assert_eq!(
            fn_get_att("Lb", "DNSName"),
            json!({"Fn::GetAtt": ["Lb", "DNSName"]})
        );
        assert_eq!(
            availability_zone(2),
            json!({"Fn::Select": [2, {"Fn::GetAZs": ""}]})
        );
    }

    #[test]
    fn test_account_root_arn() {
        assert_eq!(
            account_root_arn("468871832330"),
            json!({"Fn::Join": ["", ["arn:", {"Ref": "AWS::Partition"}, ":iam::468871832330:root"]]})
        );
    }

    #[test]
    fn test_referenced_id() {
        assert_eq!(referenced_id(&fn_ref("A")), Some("A"));
        assert_eq!(referenced_id(&fn_get_att("B", "Arn")), Some("B"));
        assert_eq!(referenced_id(&json!({"Ref": "A", "Other": 1})), None);
        assert_eq!(referenced_id(&json!("A")), None);
    }
}
