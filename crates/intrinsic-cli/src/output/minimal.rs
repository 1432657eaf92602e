use serde_json::Value;

use super::scalar_text;

/// Fields that answer "what is it worth", most specific first.
const PRIORITY_KEYS: [&str; 4] = [
    "intrinsic_value_with_debt",
    "discount_rate",
    "intrinsic_value",
    "sum_present_value",
];

/// Print just the headline number from the output.
///
/// Looks for the priority fields in the result envelope, then falls back to
/// the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", headline(result_obj));
}

fn headline(result_obj: &Value) -> String {
    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return scalar_text(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, scalar_text(val));
        }
    }

    scalar_text(result_obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefers_debt_adjusted_value() {
        let result = json!({
            "intrinsic_value": "12.5",
            "intrinsic_value_with_debt": "10.1",
            "discount_rate_used": "1.06",
        });
        assert_eq!(headline(&result), "10.1");
    }

    #[test]
    fn test_discount_rate_output() {
        let result = json!({ "discount_rate": "1.065", "source": "Beta" });
        assert_eq!(headline(&result), "1.065");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let result = json!({ "alpha": 1 });
        assert_eq!(headline(&result), "alpha: 1");
    }
}
