//! Runtime intrinsic table.
//!
//! A single data-driven table maps source-language callable names to the
//! C functions of the prebuilt `omni_rt` runtime, together with the
//! return kind the call emitter needs for cleanup tracking and async
//! wrapping. A source function whose name appears here is never emitted
//! with a body.

use std::collections::HashMap;
use std::sync::LazyLock;

/// What a runtime call produces, as far as the emitter cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetKind {
    Void,
    Int,
    Float,
    Bool,
    /// Heap string owned by the caller; tracked for cleanup.
    Str,
    /// Opaque runtime pointer (collections, handles).
    Ptr,
    /// `omni_struct_t*` aggregate.
    Struct,
    /// `omni_promise_t*`; tracked for `omni_promise_free`.
    Promise,
}

pub struct Intrinsic {
    pub c_name: &'static str,
    pub ret: RetKind,
}

/// (source name, C name, return kind). Bare names are the call forms the
/// language uses after `import std.*`; the dotted `std.io.*` forms are
/// the fully qualified spellings.
const TABLE: &[(&str, &str, RetKind)] = &[
    // I/O
    ("print", "omni_print_string", RetKind::Void),
    ("println", "omni_println_string", RetKind::Void),
    ("read_line", "omni_read_line", RetKind::Str),
    ("std.io.print", "omni_print_string", RetKind::Void),
    ("std.io.println", "omni_println_string", RetKind::Void),
    ("std.io.read_line", "omni_read_line", RetKind::Str),
    // Strings
    ("strlen", "omni_strlen", RetKind::Int),
    ("strcat", "omni_strcat", RetKind::Str),
    ("substring", "omni_substring", RetKind::Str),
    ("char_at", "omni_char_at", RetKind::Str),
    ("starts_with", "omni_starts_with", RetKind::Bool),
    ("ends_with", "omni_ends_with", RetKind::Bool),
    ("contains", "omni_contains", RetKind::Bool),
    ("index_of", "omni_index_of", RetKind::Int),
    ("last_index_of", "omni_last_index_of", RetKind::Int),
    ("trim", "omni_trim", RetKind::Str),
    ("to_upper", "omni_to_upper", RetKind::Str),
    ("to_lower", "omni_to_lower", RetKind::Str),
    ("string_equals", "omni_string_equals", RetKind::Bool),
    ("string_compare", "omni_string_compare", RetKind::Int),
    ("string_is_alpha", "omni_string_is_alpha", RetKind::Bool),
    ("string_is_digit", "omni_string_is_digit", RetKind::Bool),
    ("string_is_alnum", "omni_string_is_alnum", RetKind::Bool),
    ("string_is_ascii", "omni_string_is_ascii", RetKind::Bool),
    ("string_is_upper", "omni_string_is_upper", RetKind::Bool),
    ("string_is_lower", "omni_string_is_lower", RetKind::Bool),
    ("encode_base64", "omni_encode_base64", RetKind::Str),
    ("decode_base64", "omni_decode_base64", RetKind::Str),
    ("encode_url", "omni_encode_url", RetKind::Str),
    ("decode_url", "omni_decode_url", RetKind::Str),
    ("escape_html", "omni_escape_html", RetKind::Str),
    ("escape_json", "omni_escape_json", RetKind::Str),
    ("escape_shell", "omni_escape_shell", RetKind::Str),
    ("unescape_html", "omni_unescape_html", RetKind::Str),
    ("string_matches", "omni_string_matches", RetKind::Bool),
    ("string_find_match", "omni_string_find_match", RetKind::Str),
    ("string_find_all_matches", "omni_string_find_all_matches", RetKind::Ptr),
    ("string_replace_regex", "omni_string_replace_regex", RetKind::Str),
    // Math
    ("abs", "omni_abs", RetKind::Int),
    ("max", "omni_max", RetKind::Int),
    ("min", "omni_min", RetKind::Int),
    ("pow", "omni_pow", RetKind::Float),
    ("sqrt", "omni_sqrt", RetKind::Float),
    ("floor", "omni_floor", RetKind::Float),
    ("ceil", "omni_ceil", RetKind::Float),
    ("round", "omni_round", RetKind::Float),
    ("gcd", "omni_gcd", RetKind::Int),
    ("lcm", "omni_lcm", RetKind::Int),
    ("factorial", "omni_factorial", RetKind::Int),
    ("sin", "omni_sin", RetKind::Float),
    ("cos", "omni_cos", RetKind::Float),
    ("tan", "omni_tan", RetKind::Float),
    ("asin", "omni_asin", RetKind::Float),
    ("acos", "omni_acos", RetKind::Float),
    ("atan", "omni_atan", RetKind::Float),
    ("atan2", "omni_atan2", RetKind::Float),
    ("exp", "omni_exp", RetKind::Float),
    ("log", "omni_log", RetKind::Float),
    ("log10", "omni_log10", RetKind::Float),
    ("log2", "omni_log2", RetKind::Float),
    ("sinh", "omni_sinh", RetKind::Float),
    ("cosh", "omni_cosh", RetKind::Float),
    ("tanh", "omni_tanh", RetKind::Float),
    ("cbrt", "omni_cbrt", RetKind::Float),
    ("trunc", "omni_trunc", RetKind::Float),
    // Conversions
    ("int_to_string", "omni_int_to_string", RetKind::Str),
    ("float_to_string", "omni_float_to_string", RetKind::Str),
    ("bool_to_string", "omni_bool_to_string", RetKind::Str),
    ("string_to_int", "omni_string_to_int", RetKind::Int),
    ("string_to_float", "omni_string_to_float", RetKind::Float),
    ("string_to_bool", "omni_string_to_bool", RetKind::Bool),
    // Collections
    ("map_create", "omni_map_create", RetKind::Ptr),
    ("set_create", "omni_set_create", RetKind::Ptr),
    ("set_add", "omni_set_add", RetKind::Void),
    ("set_contains", "omni_set_contains", RetKind::Bool),
    ("set_size", "omni_set_size", RetKind::Int),
    ("queue_create", "omni_queue_create", RetKind::Ptr),
    ("queue_enqueue", "omni_queue_enqueue", RetKind::Void),
    ("queue_dequeue", "omni_queue_dequeue", RetKind::Int),
    ("queue_size", "omni_queue_size", RetKind::Int),
    ("stack_create", "omni_stack_create", RetKind::Ptr),
    ("stack_push", "omni_stack_push", RetKind::Void),
    ("stack_pop", "omni_stack_pop", RetKind::Int),
    ("stack_size", "omni_stack_size", RetKind::Int),
    ("priority_queue_create", "omni_priority_queue_create", RetKind::Ptr),
    ("priority_queue_push", "omni_priority_queue_push", RetKind::Void),
    ("priority_queue_pop", "omni_priority_queue_pop", RetKind::Int),
    ("linked_list_create", "omni_linked_list_create", RetKind::Ptr),
    ("linked_list_append", "omni_linked_list_append", RetKind::Void),
    ("linked_list_get", "omni_linked_list_get", RetKind::Int),
    ("binary_tree_create", "omni_binary_tree_create", RetKind::Ptr),
    ("binary_tree_insert", "omni_binary_tree_insert", RetKind::Void),
    ("binary_tree_contains", "omni_binary_tree_contains", RetKind::Bool),
    // Arrays (len is special-cased by the call emitter)
    ("array_get", "omni_array_get_int", RetKind::Int),
    ("array_set", "omni_array_set_int", RetKind::Void),
    // Structs
    ("struct_create", "omni_struct_create", RetKind::Struct),
    // Promises
    ("promise_create_int", "omni_promise_create_int", RetKind::Promise),
    ("promise_create_string", "omni_promise_create_string", RetKind::Promise),
    ("promise_create_float", "omni_promise_create_float", RetKind::Promise),
    ("promise_create_bool", "omni_promise_create_bool", RetKind::Promise),
    // Files
    ("file_open", "omni_file_open", RetKind::Int),
    ("file_close", "omni_file_close", RetKind::Void),
    ("file_read", "omni_file_read", RetKind::Str),
    ("file_write", "omni_file_write", RetKind::Void),
    ("file_seek", "omni_file_seek", RetKind::Int),
    ("file_tell", "omni_file_tell", RetKind::Int),
    ("file_exists", "omni_file_exists", RetKind::Bool),
    ("file_size", "omni_file_size", RetKind::Int),
    ("read_file", "omni_read_file", RetKind::Str),
    ("write_file", "omni_write_file", RetKind::Void),
    ("append_file", "omni_append_file", RetKind::Void),
    // OS
    ("exit", "omni_exit", RetKind::Void),
    ("getenv", "omni_getenv", RetKind::Str),
    ("setenv", "omni_setenv", RetKind::Void),
    ("unsetenv", "omni_unsetenv", RetKind::Void),
    ("getcwd", "omni_getcwd", RetKind::Str),
    ("chdir", "omni_chdir", RetKind::Void),
    ("mkdir", "omni_mkdir", RetKind::Void),
    ("rmdir", "omni_rmdir", RetKind::Void),
    ("remove", "omni_remove", RetKind::Void),
    ("rename", "omni_rename", RetKind::Void),
    ("copy", "omni_copy", RetKind::Void),
    ("exists", "omni_exists", RetKind::Bool),
    ("is_file", "omni_is_file", RetKind::Bool),
    ("is_dir", "omni_is_dir", RetKind::Bool),
    ("getpid", "omni_getpid", RetKind::Int),
    ("getppid", "omni_getppid", RetKind::Int),
    ("args_get", "omni_args_get", RetKind::Str),
    ("args_count", "omni_args_count", RetKind::Int),
    ("args_has_flag", "omni_args_has_flag", RetKind::Bool),
    ("args_get_flag", "omni_args_get_flag", RetKind::Str),
    ("args_positional", "omni_args_positional", RetKind::Str),
    // Time
    ("time.now_unix", "omni_time_now_unix", RetKind::Int),
    ("time.now_unix_nano", "omni_time_now_unix_nano", RetKind::Int),
    ("sleep_seconds", "omni_time_sleep_seconds", RetKind::Void),
    ("sleep_milliseconds", "omni_time_sleep_milliseconds", RetKind::Void),
    ("time.zone_offset", "omni_time_zone_offset", RetKind::Int),
    ("time.zone_name", "omni_time_zone_name", RetKind::Str),
    ("time.from_unix", "omni_time_from_unix", RetKind::Struct),
    ("time.to_unix", "omni_time_to_unix", RetKind::Int),
    ("time.to_string", "omni_time_to_string", RetKind::Str),
    ("time.from_string", "omni_time_from_string", RetKind::Struct),
    ("time.to_unix_nano", "omni_time_to_unix_nano", RetKind::Int),
    ("duration_to_string", "omni_duration_to_string", RetKind::Str),
    // Network / HTTP / sockets
    ("ip_parse", "omni_ip_parse", RetKind::Struct),
    ("ip_to_string", "omni_ip_to_string", RetKind::Str),
    ("url_parse", "omni_url_parse", RetKind::Struct),
    ("url_to_string", "omni_url_to_string", RetKind::Str),
    ("dns_lookup", "omni_dns_lookup", RetKind::Struct),
    ("http_get", "omni_http_get", RetKind::Struct),
    ("http_post", "omni_http_post", RetKind::Struct),
    ("socket_create", "omni_socket_create", RetKind::Int),
    ("socket_connect", "omni_socket_connect", RetKind::Int),
    ("socket_send", "omni_socket_send", RetKind::Int),
    ("socket_recv", "omni_socket_recv", RetKind::Str),
    ("socket_close", "omni_socket_close", RetKind::Void),
    ("network_interfaces", "omni_network_interfaces", RetKind::Ptr),
    // Testing
    ("test_start", "omni_test_start", RetKind::Void),
    ("test_end", "omni_test_end", RetKind::Void),
    ("test_summary", "omni_test_summary", RetKind::Int),
];

pub static INTRINSICS: LazyLock<HashMap<&'static str, Intrinsic>> = LazyLock::new(|| {
    let mut table = HashMap::with_capacity(TABLE.len());
    for &(name, c_name, ret) in TABLE {
        table.insert(name, Intrinsic { c_name, ret });
    }
    table
});

/// Look up an intrinsic by its source name.
pub fn intrinsic(name: &str) -> Option<&'static Intrinsic> {
    INTRINSICS.get(name)
}

/// True when a source function of this name must not be emitted with a
/// body (the runtime provides it).
pub fn is_intrinsic(name: &str) -> bool {
    INTRINSICS.contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_dotted_and_bare_name() {
        assert_eq!(intrinsic("println").unwrap().c_name, "omni_println_string");
        assert_eq!(
            intrinsic("std.io.println").unwrap().c_name,
            "omni_println_string"
        );
        assert!(intrinsic("no_such_function").is_none());
    }

    #[test]
    fn test_return_kinds() {
        assert_eq!(intrinsic("read_line").unwrap().ret, RetKind::Str);
        assert_eq!(intrinsic("strlen").unwrap().ret, RetKind::Int);
        assert_eq!(intrinsic("http_get").unwrap().ret, RetKind::Struct);
        assert_eq!(intrinsic("promise_create_int").unwrap().ret, RetKind::Promise);
    }

    #[test]
    fn test_body_skip_rule() {
        assert!(is_intrinsic("read_line"));
        assert!(!is_intrinsic("main"));
    }
}
