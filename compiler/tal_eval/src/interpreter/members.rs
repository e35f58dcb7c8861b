//! Property and index access, plus built-in methods on core values.
//!
//! Built-in members are part of the language and are not capability
//! gated: `length` on arrays and strings, array `push`/`pop`/`includes`/
//! `join`/`index_of`, and string `split`/`includes`/`upper`/`lower`/`trim`.
//! Anything richer lives in the host modules.

use super::function_call::ArgList;
use super::Interpreter;
use crate::errors::{
    cannot_index, index_out_of_bounds, no_such_method, no_such_property, null_reference,
    wrong_arg_count, wrong_arg_type, EvalError, EvalResult,
};
use crate::value::{format_number, ArrayRef, Value};
use tal_ir::{Name, Span};

impl Interpreter {
    /// `receiver.property`. Missing object keys read as `null`.
    pub(crate) fn get_property(&self, receiver: &Value, property: Name) -> Result<Value, EvalError> {
        let key = self.interner.lookup(property);
        match receiver {
            Value::Null => Err(null_reference(key)),
            Value::Object(map) => Ok(map.borrow().get(key).cloned().unwrap_or_default()),
            Value::Array(items) if key == "length" => Ok(Value::number(items.borrow().len() as f64)),
            Value::Str(text) if key == "length" => Ok(Value::number(text.chars().count() as f64)),
            Value::Exception(record) => record
                .property(key)
                .ok_or_else(|| no_such_property(key, "exception")),
            other => Err(no_such_property(key, other.type_name())),
        }
    }

    pub(crate) fn set_property(
        &self,
        receiver: &Value,
        property: Name,
        value: Value,
    ) -> Result<(), EvalError> {
        let key = self.interner.lookup(property);
        match receiver {
            Value::Null => Err(null_reference(key)),
            Value::Object(map) => {
                map.borrow_mut().insert(key.to_string(), value);
                Ok(())
            }
            other => Err(no_such_property(key, other.type_name())),
        }
    }

    /// `receiver[index]`.
    pub(crate) fn get_index(&self, receiver: &Value, index: &Value) -> Result<Value, EvalError> {
        match (receiver, index) {
            (Value::Array(items), Value::Number(n)) => {
                let items = items.borrow();
                let i = checked_index(*n, items.len())?;
                Ok(items[i].clone())
            }
            (Value::Str(text), Value::Number(n)) => {
                let length = text.chars().count();
                let i = checked_index(*n, length)?;
                Ok(text
                    .chars()
                    .nth(i)
                    .map(|c| Value::string(c.to_string()))
                    .unwrap_or_default())
            }
            (Value::Object(map), Value::Str(key)) => {
                Ok(map.borrow().get(&**key).cloned().unwrap_or_default())
            }
            (Value::Object(map), Value::Number(n)) => {
                Ok(map.borrow().get(&format_number(*n)).cloned().unwrap_or_default())
            }
            (Value::Null, _) => Err(null_reference("[]")),
            _ => Err(cannot_index(receiver.type_name(), index.type_name())),
        }
    }

    /// `receiver[index] = value`. Writing one past the end of an array appends.
    pub(crate) fn set_index(
        &self,
        receiver: &Value,
        index: &Value,
        value: Value,
    ) -> Result<(), EvalError> {
        match (receiver, index) {
            (Value::Array(items), Value::Number(n)) => {
                let mut items = items.borrow_mut();
                let length = items.len();
                if n.fract() == 0.0 && *n >= 0.0 && *n as usize == length {
                    items.push(value);
                } else {
                    let i = checked_index(*n, length)?;
                    items[i] = value;
                }
                Ok(())
            }
            (Value::Object(map), Value::Str(key)) => {
                map.borrow_mut().insert(key.to_string(), value);
                Ok(())
            }
            (Value::Object(map), Value::Number(n)) => {
                map.borrow_mut().insert(format_number(*n), value);
                Ok(())
            }
            (Value::Null, _) => Err(null_reference("[]")),
            _ => Err(cannot_index(receiver.type_name(), index.type_name())),
        }
    }

    /// `receiver.method(args)`.
    ///
    /// Objects call the function stored under `method`; arrays and strings
    /// dispatch to built-in methods.
    pub(crate) fn call_method(
        &mut self,
        receiver: Value,
        method: Name,
        args: ArgList,
        span: Span,
    ) -> EvalResult {
        let name = self.interner.lookup(method);
        match &receiver {
            Value::Null => Err(null_reference(name).into()),
            Value::Object(_) | Value::Exception(_) => {
                let function = self.get_property(&receiver, method)?;
                if function.is_null() {
                    return Err(no_such_method(name, receiver.type_name()).into());
                }
                self.call_function(&function, args, span)
            }
            Value::Array(items) => Ok(array_method(items, name, &args)?),
            Value::Str(text) => Ok(string_method(text, name, &args)?),
            other => Err(no_such_method(name, other.type_name()).into()),
        }
    }
}

/// Integral, in-range index.
fn checked_index(n: f64, length: usize) -> Result<usize, EvalError> {
    if n.fract() == 0.0 && n >= 0.0 && (n as usize) < length {
        Ok(n as usize)
    } else {
        Err(index_out_of_bounds(n as i64, length))
    }
}

fn expect_args(method: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(wrong_arg_count(method, expected, args.len()))
    }
}

fn string_arg<'a>(method: &str, args: &'a [Value], i: usize) -> Result<&'a str, EvalError> {
    match args.get(i) {
        Some(Value::Str(s)) => Ok(s),
        other => Err(wrong_arg_type(
            method,
            i,
            "string",
            other.map_or("nothing", Value::type_name),
        )),
    }
}

fn array_method(items: &ArrayRef, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match method {
        "push" => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().cloned());
            Ok(Value::number(items.len() as f64))
        }
        "pop" => {
            expect_args(method, args, 0)?;
            Ok(items.borrow_mut().pop().unwrap_or_default())
        }
        "includes" => {
            expect_args(method, args, 1)?;
            Ok(Value::Bool(items.borrow().iter().any(|item| item.equals(&args[0]))))
        }
        "index_of" => {
            expect_args(method, args, 1)?;
            let position = items.borrow().iter().position(|item| item.equals(&args[0]));
            Ok(position.map_or(Value::int(-1), |i| Value::number(i as f64)))
        }
        "join" => {
            let separator = match args.len() {
                0 => ",",
                1 => string_arg(method, args, 0)?,
                got => return Err(wrong_arg_count(method, "0 to 1", got)),
            };
            let joined = items
                .borrow()
                .iter()
                .map(Value::display_value)
                .collect::<Vec<_>>()
                .join(separator);
            Ok(Value::string(joined))
        }
        _ => Err(no_such_method(method, "array")),
    }
}

fn string_method(text: &str, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match method {
        "split" => {
            expect_args(method, args, 1)?;
            let separator = string_arg(method, args, 0)?;
            let parts: Vec<Value> = if separator.is_empty() {
                text.chars().map(|c| Value::string(c.to_string())).collect()
            } else {
                text.split(separator).map(Value::string).collect()
            };
            Ok(Value::array(parts))
        }
        "includes" => {
            expect_args(method, args, 1)?;
            Ok(Value::Bool(text.contains(string_arg(method, args, 0)?)))
        }
        "upper" => {
            expect_args(method, args, 0)?;
            Ok(Value::string(text.to_uppercase()))
        }
        "lower" => {
            expect_args(method, args, 0)?;
            Ok(Value::string(text.to_lowercase()))
        }
        "trim" => {
            expect_args(method, args, 0)?;
            Ok(Value::string(text.trim()))
        }
        _ => Err(no_such_method(method, "string")),
    }
}
