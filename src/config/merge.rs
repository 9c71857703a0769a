use serde_json::Value;

/// Recursively merge `layer` onto `base`
///
/// Objects merge key by key. Any other value replaces what is below it, except
/// `null`, which leaves the lower layer untouched.
pub fn merge(base: &mut Value, layer: &Value) {
    match (base, layer) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        if !value.is_null() {
                            base_map.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        (base, layer) => *base = layer.clone(),
    }
}

/// Merge `layers` in order onto `base`, later layers taking precedence
pub fn merge_all<'a>(mut base: Value, layers: impl IntoIterator<Item = &'a Value>) -> Value {
    for layer in layers {
        merge(&mut base, layer);
    }
    base
}
