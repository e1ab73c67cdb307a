//! Source-type to C-type mapping.

use super::Codegen;
use crate::mir::TYPE_INFER;

/// Runtime collection kinds that map to `omni_<kind>_t*`.
const COLLECTION_KINDS: &[&str] = &[
    "set",
    "queue",
    "stack",
    "priority_queue",
    "linked_list",
    "binary_tree",
];

impl Codegen {
    /// Map a source type string to its C type. Unknown shapes are
    /// recorded as errors and fall back to `int32_t` so downstream
    /// problems can still surface in the same run.
    pub(super) fn map_type(&mut self, ty: &str) -> String {
        let ty = ty.trim();
        match ty {
            "" | TYPE_INFER => return "int32_t".to_string(),
            "int" | "bool" => return "int32_t".to_string(),
            "float" | "double" => return "double".to_string(),
            "string" => return "const char*".to_string(),
            "void" => return "void".to_string(),
            "ptr" | "void*" => return "void*".to_string(),
            _ => {}
        }

        if let Some(inner) = ty.strip_prefix('*') {
            return format!("{}*", self.map_type(inner));
        }
        if let Some(inner) = strip_generic(ty, "array").or_else(|| strip_brackets(ty)) {
            return format!("{}*", self.map_type(&inner));
        }
        if strip_generic(ty, "map").is_some() {
            return "omni_map_t*".to_string();
        }
        for kind in COLLECTION_KINDS {
            if strip_generic(ty, kind).is_some() {
                return format!("omni_{}_t*", kind);
            }
        }
        if strip_generic(ty, "Promise").is_some() {
            return "omni_promise_t*".to_string();
        }
        if ty.contains("->") {
            return self.map_fn_pointer(ty, None);
        }

        if is_identifier_like(ty) {
            // Any other identifier is a user struct.
            return "omni_struct_t*".to_string();
        }

        self.warn(format!("unknown source type '{}'", ty));
        "int32_t".to_string()
    }

    /// Function-pointer mapping: `(P1, P2) -> R` becomes
    /// `R (*name)(P1, P2)`; with no name the declarator slot is empty,
    /// which is the form used in casts.
    pub(super) fn map_fn_pointer(&mut self, ty: &str, name: Option<&str>) -> String {
        let Some((params, ret)) = split_fn_type(ty) else {
            self.warn(format!("unknown source type '{}'", ty));
            return "int32_t".to_string();
        };
        let ret_c = self.map_type(&ret);
        let params_c: Vec<String> = if params.is_empty() {
            vec!["void".to_string()]
        } else {
            params.iter().map(|p| self.map_type(p)).collect()
        };
        format!(
            "{} (*{})({})",
            ret_c,
            name.unwrap_or(""),
            params_c.join(", ")
        )
    }

    /// Declaration form of a type: most types are `<type> <name>`, but
    /// function pointers splice the name into the declarator.
    pub(super) fn declaration(&mut self, ty: &str, name: &str) -> String {
        if ty.contains("->") && split_fn_type(ty).is_some() {
            self.map_fn_pointer(ty, Some(name))
        } else {
            format!("{} {}", self.map_type(ty), name)
        }
    }
}

/// The `<kind>` suffix used by typed runtime helpers
/// (`omni_struct_get_<kind>_field`, `omni_map_put_<K>_<V>`, …).
pub(super) fn kind_suffix(ty: &str) -> Option<&'static str> {
    match ty.trim() {
        "int" => Some("int"),
        "bool" => Some("bool"),
        "float" | "double" => Some("float"),
        "string" => Some("string"),
        _ => None,
    }
}

/// Split a normalized `map<K, V>` into its key/value types.
pub(super) fn map_key_value(ty: &str) -> Option<(String, String)> {
    let inner = strip_generic(ty, "map")?;
    let (k, v) = split_top_level_comma(&inner)?;
    Some((k.trim().to_string(), v.trim().to_string()))
}

/// Element type of `array<T>` / `[]<T>` / `[]T` / `*T`.
pub(super) fn array_element(ty: &str) -> Option<String> {
    strip_generic(ty, "array")
        .or_else(|| strip_brackets(ty))
        .map(|t| t.trim().to_string())
}

/// Payload of `Promise<T>`.
pub(super) fn promise_payload(ty: &str) -> Option<String> {
    strip_generic(ty, "Promise").map(|t| t.trim().to_string())
}

/// True when the source type names a user struct (an identifier that is
/// none of the built-in families).
pub(super) fn is_struct_type(ty: &str) -> bool {
    let ty = ty.trim();
    if matches!(
        ty,
        "" | TYPE_INFER | "int" | "bool" | "float" | "double" | "string" | "void" | "ptr" | "void*"
    ) {
        return false;
    }
    if ty.starts_with('*') || ty.starts_with("[]") || ty.contains("->") {
        return false;
    }
    if strip_generic(ty, "array").is_some()
        || strip_generic(ty, "map").is_some()
        || strip_generic(ty, "Promise").is_some()
        || COLLECTION_KINDS.iter().any(|k| strip_generic(ty, k).is_some())
    {
        return false;
    }
    is_identifier_like(ty)
}

fn strip_generic(ty: &str, head: &str) -> Option<String> {
    let rest = ty.strip_prefix(head)?;
    let rest = rest.strip_prefix('<')?;
    let rest = rest.strip_suffix('>')?;
    Some(rest.to_string())
}

/// `[]<T>` or `[]T`.
fn strip_brackets(ty: &str) -> Option<String> {
    let rest = ty.strip_prefix("[]")?;
    let rest = rest
        .strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .unwrap_or(rest);
    Some(rest.to_string())
}

fn split_top_level_comma(s: &str) -> Option<(String, String)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                return Some((s[..i].to_string(), s[i + 1..].to_string()));
            }
            _ => {}
        }
    }
    None
}

/// `(P1, P2) -> R` into (params, return).
fn split_fn_type(ty: &str) -> Option<(Vec<String>, String)> {
    let ty = ty.trim();
    let rest = ty.strip_prefix('(')?;
    let close = matching_paren(rest)?;
    let params_text = &rest[..close];
    let after = rest[close + 1..].trim();
    let ret = after.strip_prefix("->")?.trim().to_string();

    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in params_text.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(params_text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = params_text[start..].trim();
    if !last.is_empty() {
        params.push(last.to_string());
    }
    Some((params, ret))
}

fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_identifier_like(ty: &str) -> bool {
    !ty.is_empty()
        && ty
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(ty: &str) -> String {
        Codegen::new().map_type(ty)
    }

    #[test]
    fn test_primitive_mapping() {
        assert_eq!(map("int"), "int32_t");
        assert_eq!(map("bool"), "int32_t");
        assert_eq!(map("float"), "double");
        assert_eq!(map("double"), "double");
        assert_eq!(map("string"), "const char*");
        assert_eq!(map("void"), "void");
        assert_eq!(map("ptr"), "void*");
    }

    #[test]
    fn test_pointer_and_array_mapping() {
        assert_eq!(map("*int"), "int32_t*");
        assert_eq!(map("array<int>"), "int32_t*");
        assert_eq!(map("[]<string>"), "const char**");
        assert_eq!(map("[]int"), "int32_t*");
    }

    #[test]
    fn test_collection_mapping() {
        assert_eq!(map("map<string, int>"), "omni_map_t*");
        assert_eq!(map("set<int>"), "omni_set_t*");
        assert_eq!(map("priority_queue<int>"), "omni_priority_queue_t*");
        assert_eq!(map("Promise<int>"), "omni_promise_t*");
    }

    #[test]
    fn test_user_struct_mapping() {
        assert_eq!(map("Point"), "omni_struct_t*");
        assert_eq!(map("net.Conn"), "omni_struct_t*");
        assert!(is_struct_type("Point"));
        assert!(!is_struct_type("map<string, int>"));
        assert!(!is_struct_type("int"));
    }

    #[test]
    fn test_function_pointer_declaration() {
        let mut cg = Codegen::new();
        assert_eq!(
            cg.declaration("(int, string) -> bool", "cb"),
            "int32_t (*cb)(int32_t, const char*)"
        );
        assert_eq!(cg.declaration("int", "x"), "int32_t x");
    }

    #[test]
    fn test_unknown_type_falls_back_with_error() {
        let mut cg = Codegen::new();
        assert_eq!(cg.map_type("???"), "int32_t");
        assert_eq!(cg.errors.len(), 1);
        assert!(cg.errors[0].contains("unknown source type"));
    }

    #[test]
    fn test_map_key_value() {
        assert_eq!(
            map_key_value("map<string, int>"),
            Some(("string".to_string(), "int".to_string()))
        );
        assert_eq!(map_key_value("array<int>"), None);
    }
}
