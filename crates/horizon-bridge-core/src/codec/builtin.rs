//! Built-in codecs.

use super::{Codec, CodecContext};
use crate::error::{BridgeError, Result};
use crate::logging::targets;
use crate::value::{Value, WireRepresentable};
use crate::wire;

const FALSEY_WORDS: [&str; 4] = ["0", "false", "no", "off"];

fn is_falsey_word(s: &str) -> bool {
    FALSEY_WORDS.iter().any(|w| w.eq_ignore_ascii_case(s))
}

/// Byte length of the leading integer in `s` (sign included), if any digits.
fn integer_prefix(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    (end > digits_start).then_some(end)
}

/// Byte length of the leading float in `s`, if any digits.
fn float_prefix(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    Some(end)
}

/// Passes values through as strings.
///
/// Callables still become registration tokens, so an option without a
/// declared codec can take a command.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    fn name(&self) -> &str {
        "string"
    }

    fn encode(&self, value: &Value, cx: &CodecContext<'_>) -> Result<String> {
        match value {
            Value::Callback(_) => CallbackCodec.encode(value, cx),
            other => Ok(other.render()),
        }
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        Ok(Value::Str(wire.to_string()))
    }
}

/// Integers with lenient decoding.
///
/// `"10c"` decodes to `10`: screen distances carry unit suffixes that the
/// integer view ignores. An empty wire string decodes to [`Value::Nil`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl Codec for IntegerCodec {
    fn name(&self) -> &str {
        "integer"
    }

    fn encode(&self, value: &Value, cx: &CodecContext<'_>) -> Result<String> {
        Ok(match value {
            Value::Nil => cx.unset_sentinel().to_string(),
            other => other.render(),
        })
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        let trimmed = wire.trim();
        if trimmed.is_empty() {
            return Ok(Value::Nil);
        }
        let end = integer_prefix(trimmed)
            .ok_or_else(|| BridgeError::conversion(self.name(), wire, "expected integer"))?;
        trimmed[..end]
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| BridgeError::conversion(self.name(), wire, e.to_string()))
    }
}

/// Floating point numbers with lenient decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCodec;

impl Codec for FloatCodec {
    fn name(&self) -> &str {
        "float"
    }

    fn encode(&self, value: &Value, cx: &CodecContext<'_>) -> Result<String> {
        Ok(match value {
            Value::Nil => cx.unset_sentinel().to_string(),
            other => other.render(),
        })
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        let trimmed = wire.trim();
        if trimmed.is_empty() {
            return Ok(Value::Nil);
        }
        let end = float_prefix(trimmed)
            .ok_or_else(|| BridgeError::conversion(self.name(), wire, "expected floating-point number"))?;
        trimmed[..end]
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| BridgeError::conversion(self.name(), wire, e.to_string()))
    }
}

/// Booleans as `0`/`1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl Codec for BooleanCodec {
    fn name(&self) -> &str {
        "boolean"
    }

    fn encode(&self, value: &Value, _cx: &CodecContext<'_>) -> Result<String> {
        let falsey = match value {
            Value::Nil => true,
            Value::Bool(b) => !b,
            Value::Int(n) => *n == 0,
            Value::Float(n) => *n == 0.0,
            Value::Str(s) => is_falsey_word(s),
            _ => false,
        };
        Ok(String::from(if falsey { "0" } else { "1" }))
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        Ok(Value::Bool(!(wire.is_empty() || is_falsey_word(wire))))
    }
}

/// Whitespace separated lists without quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCodec;

impl Codec for ListCodec {
    fn name(&self) -> &str {
        "list"
    }

    fn encode(&self, value: &Value, _cx: &CodecContext<'_>) -> Result<String> {
        Ok(value.render())
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        Ok(Value::List(
            wire.split_whitespace().map(Value::from).collect(),
        ))
    }
}

/// Lists in full native list syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotedListCodec;

impl Codec for QuotedListCodec {
    fn name(&self) -> &str {
        "quoted_list"
    }

    fn encode(&self, value: &Value, _cx: &CodecContext<'_>) -> Result<String> {
        Ok(match value {
            Value::List(items) => wire::join_list(items.iter().map(WireRepresentable::render)),
            other => other.render(),
        })
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        Ok(Value::List(
            wire::split_list(wire)?.into_iter().map(Value::Str).collect(),
        ))
    }
}

/// Numbers where possible, strings otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberOrStringCodec;

impl Codec for NumberOrStringCodec {
    fn name(&self) -> &str {
        "number_or_string"
    }

    fn encode(&self, value: &Value, _cx: &CodecContext<'_>) -> Result<String> {
        Ok(value.render())
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        let trimmed = wire.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        if !trimmed.is_empty() {
            if let Ok(n) = trimmed.parse::<f64>() {
                return Ok(Value::Float(n));
            }
        }
        Ok(Value::Str(wire.to_string()))
    }
}

/// Colors as names or `#rrggbb`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorCodec;

impl Codec for ColorCodec {
    fn name(&self) -> &str {
        "color"
    }

    fn encode(&self, value: &Value, _cx: &CodecContext<'_>) -> Result<String> {
        if let Value::List(items) = value {
            if let [r, g, b] = items.as_slice() {
                if let (Some(r), Some(g), Some(b)) = (r.as_int(), g.as_int(), b.as_int()) {
                    let clamp = |c: i64| c.clamp(0, 255);
                    return Ok(format!("#{:02x}{:02x}{:02x}", clamp(r), clamp(g), clamp(b)));
                }
            }
        }
        Ok(value.render())
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        if wire.is_empty() {
            Ok(Value::Nil)
        } else {
            Ok(Value::Str(wire.to_string()))
        }
    }
}

/// Widget references by path.
///
/// Decoding resolves period-prefixed paths through the identity registry and
/// keeps the raw path when nothing is registered under it. Strings that do
/// not look like a path decode to nil.
#[derive(Debug, Clone, Copy, Default)]
pub struct WidgetCodec;

impl Codec for WidgetCodec {
    fn name(&self) -> &str {
        "widget"
    }

    fn encode(&self, value: &Value, _cx: &CodecContext<'_>) -> Result<String> {
        Ok(value.render())
    }

    fn decode(&self, wire: &str, cx: &CodecContext<'_>) -> Result<Value> {
        if !wire.starts_with('.') {
            return Ok(Value::Nil);
        }
        Ok(match cx.identities {
            Some(identities) => identities.resolve(wire),
            None => Value::Str(wire.to_string()),
        })
    }
}

/// Fonts as registered font objects, descriptions, or `[family, size, styles...]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontCodec;

impl Codec for FontCodec {
    fn name(&self) -> &str {
        "font"
    }

    fn encode(&self, value: &Value, _cx: &CodecContext<'_>) -> Result<String> {
        Ok(match value {
            Value::List(items) => wire::join_list(items.iter().map(WireRepresentable::render)),
            other => other.render(),
        })
    }

    fn decode(&self, wire: &str, cx: &CodecContext<'_>) -> Result<Value> {
        if wire.is_empty() {
            return Ok(Value::Nil);
        }
        if let Some(font) = cx.identities.and_then(|ids| ids.lookup(wire)) {
            return Ok(Value::Widget(font));
        }
        Ok(Value::Str(wire.to_string()))
    }
}

/// Callables as registration tokens.
///
/// Decoding cannot recover the callable from its token, so it returns the
/// token string.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackCodec;

impl Codec for CallbackCodec {
    fn name(&self) -> &str {
        "callback"
    }

    fn encode(&self, value: &Value, cx: &CodecContext<'_>) -> Result<String> {
        match value {
            Value::Callback(callback) => {
                let surface = cx.callbacks.ok_or(BridgeError::NoCallbackSurface)?;
                let token = surface.register_callback(callback.clone());
                tracing::trace!(target: targets::CODEC, owner = ?cx.owner, %token, "registered callback");
                Ok(token)
            }
            other => Ok(other.render()),
        }
    }

    fn decode(&self, wire: &str, _cx: &CodecContext<'_>) -> Result<Value> {
        Ok(Value::Str(wire.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::headless::HeadlessSurface;
    use crate::identity::IdentityRegistry;
    use crate::native::{CallbackSurface, NativeVersion};
    use crate::value::{Callback, WidgetRef};

    fn cx_86() -> CodecContext<'static> {
        CodecContext::new(NativeVersion::new(8, 6))
    }

    fn cx_90() -> CodecContext<'static> {
        CodecContext::new(NativeVersion::new(9, 0))
    }

    #[test]
    fn test_boolean_encode() {
        let cx = cx_86();
        for word in ["no", "NO", "0", "false", "Off"] {
            assert_eq!(BooleanCodec.encode(&Value::from(word), &cx).unwrap(), "0", "{word}");
        }
        assert_eq!(BooleanCodec.encode(&Value::from("YES"), &cx).unwrap(), "1");
        assert_eq!(BooleanCodec.encode(&Value::from("maybe"), &cx).unwrap(), "1");
        assert_eq!(BooleanCodec.encode(&Value::Bool(false), &cx).unwrap(), "0");
        assert_eq!(BooleanCodec.encode(&Value::Nil, &cx).unwrap(), "0");
        assert_eq!(BooleanCodec.encode(&Value::Bool(true), &cx).unwrap(), "1");
    }

    #[test]
    fn test_boolean_decode() {
        let cx = cx_86();
        assert_eq!(BooleanCodec.decode("", &cx).unwrap(), Value::Bool(false));
        assert_eq!(BooleanCodec.decode("off", &cx).unwrap(), Value::Bool(false));
        assert_eq!(BooleanCodec.decode("no", &cx).unwrap(), Value::Bool(false));
        assert_eq!(BooleanCodec.decode("anything-else", &cx).unwrap(), Value::Bool(true));
        assert_eq!(BooleanCodec.decode("1", &cx).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_integer_decode_lenient() {
        let cx = cx_86();
        assert_eq!(IntegerCodec.decode("10c", &cx).unwrap(), Value::Int(10));
        assert_eq!(IntegerCodec.decode("-3", &cx).unwrap(), Value::Int(-3));
        assert_eq!(IntegerCodec.decode(" 7 ", &cx).unwrap(), Value::Int(7));
        assert_eq!(IntegerCodec.decode("", &cx).unwrap(), Value::Nil);
        assert!(IntegerCodec.decode("abc", &cx).is_err());
    }

    #[test]
    fn test_integer_unset_sentinel() {
        assert_eq!(IntegerCodec.encode(&Value::Nil, &cx_86()).unwrap(), "-1");
        assert_eq!(IntegerCodec.encode(&Value::Nil, &cx_90()).unwrap(), "");
        assert_eq!(IntegerCodec.encode(&Value::Int(12), &cx_90()).unwrap(), "12");
    }

    #[test]
    fn test_float_decode_lenient() {
        let cx = cx_90();
        assert_eq!(FloatCodec.decode("2.5m", &cx).unwrap(), Value::Float(2.5));
        assert_eq!(FloatCodec.decode("1e3", &cx).unwrap(), Value::Float(1000.0));
        assert_eq!(FloatCodec.decode("4e", &cx).unwrap(), Value::Float(4.0));
        assert_eq!(FloatCodec.decode(".5", &cx).unwrap(), Value::Float(0.5));
        assert_eq!(FloatCodec.decode("", &cx).unwrap(), Value::Nil);
        assert!(FloatCodec.decode("x1", &cx).is_err());
        assert_eq!(FloatCodec.encode(&Value::Nil, &cx_86()).unwrap(), "-1");
    }

    #[test]
    fn test_scalar_round_trips() {
        let cx = cx_90();
        for v in [Value::Int(0), Value::Int(-42), Value::Int(i64::MAX)] {
            let wire = IntegerCodec.encode(&v, &cx).unwrap();
            assert_eq!(IntegerCodec.decode(&wire, &cx).unwrap(), v);
        }
        for v in [Value::Float(0.25), Value::Float(-3.0), Value::Float(1e-7)] {
            let wire = FloatCodec.encode(&v, &cx).unwrap();
            assert_eq!(FloatCodec.decode(&wire, &cx).unwrap(), v);
        }
        for b in [true, false] {
            let wire = BooleanCodec.encode(&Value::Bool(b), &cx).unwrap();
            assert_eq!(BooleanCodec.decode(&wire, &cx).unwrap(), Value::Bool(b));
        }
    }

    #[test]
    fn test_list_codec() {
        let cx = cx_90();
        let list = Value::from(vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        let wire = ListCodec.encode(&list, &cx).unwrap();
        assert_eq!(wire, "a b c");
        assert_eq!(ListCodec.decode(&wire, &cx).unwrap(), list);
        assert_eq!(ListCodec.decode("  x\ty \n", &cx).unwrap(), Value::from(vec![Value::from("x"), Value::from("y")]));
    }

    #[test]
    fn test_quoted_list_codec() {
        let cx = cx_90();
        let list = Value::from(vec![Value::from("Helvetica"), Value::from("bold italic")]);
        let wire = QuotedListCodec.encode(&list, &cx).unwrap();
        assert_eq!(wire, "Helvetica {bold italic}");
        assert_eq!(QuotedListCodec.decode(&wire, &cx).unwrap(), list);
        assert!(QuotedListCodec.decode("{broken", &cx).is_err());
    }

    #[test]
    fn test_number_or_string_codec() {
        let cx = cx_90();
        assert_eq!(NumberOrStringCodec.decode("12", &cx).unwrap(), Value::Int(12));
        assert_eq!(NumberOrStringCodec.decode("1.5", &cx).unwrap(), Value::Float(1.5));
        assert_eq!(NumberOrStringCodec.decode("auto", &cx).unwrap(), Value::from("auto"));
        assert_eq!(NumberOrStringCodec.decode("", &cx).unwrap(), Value::from(""));
    }

    #[test]
    fn test_color_codec() {
        let cx = cx_90();
        let rgb = Value::from(vec![Value::from(255), Value::from(0), Value::from(300)]);
        assert_eq!(ColorCodec.encode(&rgb, &cx).unwrap(), "#ff00ff");
        assert_eq!(ColorCodec.encode(&Value::from("red"), &cx).unwrap(), "red");
        assert_eq!(ColorCodec.decode("#102030", &cx).unwrap(), Value::from("#102030"));
        assert_eq!(ColorCodec.decode("", &cx).unwrap(), Value::Nil);
    }

    #[test]
    fn test_widget_codec_resolves_registered_paths() {
        let identities = IdentityRegistry::new();
        let wrapper = Arc::new(String::from("button wrapper"));
        identities.register(".f.b", wrapper);
        let cx = cx_90().with_identities(&identities);

        let decoded = WidgetCodec.decode(".f.b", &cx).unwrap();
        let widget = decoded.as_widget().expect("resolved to a widget");
        assert_eq!(widget.path(), ".f.b");
        assert_eq!(WidgetCodec.encode(&decoded, &cx).unwrap(), ".f.b");

        assert_eq!(WidgetCodec.decode(".unknown", &cx).unwrap(), Value::from(".unknown"));
        assert_eq!(WidgetCodec.decode("not-a-path", &cx).unwrap(), Value::Nil);
        assert_eq!(WidgetCodec.decode("", &cx).unwrap(), Value::Nil);
    }

    #[test]
    fn test_widget_codec_encodes_strings_as_is() {
        let cx = cx_90();
        assert_eq!(WidgetCodec.encode(&Value::from(".x"), &cx).unwrap(), ".x");
        let w = WidgetRef::new(".y", Arc::new(()));
        assert_eq!(WidgetCodec.encode(&Value::from(w), &cx).unwrap(), ".y");
    }

    #[test]
    fn test_font_codec() {
        let identities = IdentityRegistry::new();
        identities.register("font1", Arc::new(7u32));
        let cx = cx_90().with_identities(&identities);

        let desc = Value::from(vec![Value::from("Courier New"), Value::from(10), Value::from("bold")]);
        assert_eq!(FontCodec.encode(&desc, &cx).unwrap(), "{Courier New} 10 bold");
        assert!(FontCodec.decode("font1", &cx).unwrap().as_widget().is_some());
        assert_eq!(FontCodec.decode("TkDefaultFont", &cx).unwrap(), Value::from("TkDefaultFont"));
    }

    #[test]
    fn test_callback_codec_registers_callable() {
        let surface = HeadlessSurface::new(NativeVersion::new(9, 0));
        let cx = cx_90().with_callbacks(&surface);
        let callback = Callback::new(|args| Ok(format!("called with {}", args.len())));

        let token = CallbackCodec.encode(&Value::from(callback), &cx).unwrap();
        assert!(!token.is_empty());
        assert_eq!(
            surface.invoke_callback(&token, &["a".into()]).unwrap(),
            "called with 1"
        );
        // Only the token comes back.
        assert_eq!(CallbackCodec.decode(&token, &cx).unwrap(), Value::from(token.as_str()));
        // Non-callables pass through.
        assert_eq!(CallbackCodec.encode(&Value::from("puts hi"), &cx).unwrap(), "puts hi");
    }

    #[test]
    fn test_string_codec_registers_callables() {
        let surface = HeadlessSurface::new(NativeVersion::new(9, 0));
        let cx = cx_90().with_callbacks(&surface);
        let callback = Callback::new(|_| Ok("ran".into()));

        let token = StringCodec.encode(&Value::from(callback), &cx).unwrap();
        assert_eq!(surface.callback_count(), 1);
        assert_eq!(surface.invoke_callback(&token, &[]).unwrap(), "ran");
        assert_eq!(StringCodec.encode(&Value::Int(7), &cx).unwrap(), "7");
    }

    #[test]
    fn test_callback_codec_without_surface() {
        let callback = Callback::new(|_| Ok(String::new()));
        let err = CallbackCodec.encode(&Value::from(callback), &cx_90()).unwrap_err();
        assert_eq!(err, BridgeError::NoCallbackSurface);
    }
}
