//! Expression evaluation.

use super::Interpreter;
use crate::environment::ScopeKind;
use crate::errors::{invalid_assignment_target, unbound_name, ControlAction, EvalResult};
use crate::operators::{evaluate_binary, evaluate_unary};
use crate::stack::ensure_sufficient_stack;
use crate::value::{FunctionValue, ObjectMap, Value};
use tal_ir::{BinaryOp, ExprId, ExprKind, FunctionId, Name, Span};

impl Interpreter {
    /// Evaluate an expression.
    ///
    /// Runtime faults raised here without a location take this node's span
    /// and a backtrace of the current call stack.
    pub(crate) fn eval_expr(&mut self, id: ExprId) -> EvalResult {
        ensure_sufficient_stack(|| {
            let expr = *self.arena.get_expr(id);
            self.eval_kind(expr.kind, expr.span)
                .map_err(|action| self.annotate(action, expr.span))
        })
    }

    fn eval_kind(&mut self, kind: ExprKind, span: Span) -> EvalResult {
        match kind {
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Bool(b) => Ok(Value::Bool(b)),
            ExprKind::Number(bits) => Ok(Value::Number(ExprKind::number_value(bits))),
            ExprKind::Str(text) => Ok(Value::string(self.interner.lookup(text))),
            ExprKind::Ident(name) => self.lookup_name(name),
            ExprKind::Array(range) => {
                let arena = self.arena.clone();
                let items = arena
                    .get_expr_list(range)
                    .iter()
                    .map(|&item| self.eval_expr(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            ExprKind::Object(range) => {
                let arena = self.arena.clone();
                let entries = arena.get_entries(range);
                let mut map = ObjectMap::with_capacity(entries.len());
                for entry in entries {
                    let value = self.eval_expr(entry.value)?;
                    map.insert(self.interner.lookup(entry.key).to_string(), value);
                }
                Ok(Value::object(map))
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(op, left, right),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                Ok(evaluate_unary(&value, op)?)
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.eval_expr(then_expr)
                } else {
                    self.eval_expr(else_expr)
                }
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args, span),
            ExprKind::Member { receiver, property } => {
                let receiver = self.eval_expr(receiver)?;
                Ok(self.get_property(&receiver, property)?)
            }
            ExprKind::Index { receiver, index } => {
                let receiver = self.eval_expr(receiver)?;
                let index = self.eval_expr(index)?;
                Ok(self.get_index(&receiver, &index)?)
            }
            ExprKind::Assign { target, op, value } => self.eval_assign(target, op, value),
            ExprKind::Function(def) => Ok(self.eval_function_expr(def)),
        }
    }

    pub(crate) fn lookup_name(&self, name: Name) -> EvalResult {
        self.env
            .get(name)
            .ok_or_else(|| unbound_name(self.interner.lookup(name)).into())
    }

    /// `&&` and `||` yield an operand and never evaluate the unchosen side.
    fn eval_binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> EvalResult {
        let left = self.eval_expr(left)?;
        match op {
            BinaryOp::And if !left.is_truthy() => return Ok(left),
            BinaryOp::Or if left.is_truthy() => return Ok(left),
            BinaryOp::And | BinaryOp::Or => return self.eval_expr(right),
            _ => {}
        }
        let right = self.eval_expr(right)?;
        Ok(evaluate_binary(&left, &right, op)?)
    }

    /// Plain and compound assignment. The assigned value is the result.
    fn eval_assign(&mut self, target: ExprId, op: Option<BinaryOp>, value: ExprId) -> EvalResult {
        let target = *self.arena.get_expr(target);
        match target.kind {
            ExprKind::Ident(name) => {
                let new_value = match op {
                    None => self.eval_expr(value)?,
                    Some(op) => {
                        let current = self.lookup_name(name)?;
                        let rhs = self.eval_expr(value)?;
                        evaluate_binary(&current, &rhs, op)?
                    }
                };
                self.env.set(name, new_value.clone());
                Ok(new_value)
            }
            ExprKind::Member { receiver, property } => {
                let receiver = self.eval_expr(receiver)?;
                let new_value = match op {
                    None => self.eval_expr(value)?,
                    Some(op) => {
                        let current = self.get_property(&receiver, property)?;
                        let rhs = self.eval_expr(value)?;
                        evaluate_binary(&current, &rhs, op)?
                    }
                };
                self.set_property(&receiver, property, new_value.clone())?;
                Ok(new_value)
            }
            ExprKind::Index { receiver, index } => {
                let receiver = self.eval_expr(receiver)?;
                let index = self.eval_expr(index)?;
                let new_value = match op {
                    None => self.eval_expr(value)?,
                    Some(op) => {
                        let current = self.get_index(&receiver, &index)?;
                        let rhs = self.eval_expr(value)?;
                        evaluate_binary(&current, &rhs, op)?
                    }
                };
                self.set_index(&receiver, &index, new_value.clone())?;
                Ok(new_value)
            }
            _ => Err(invalid_assignment_target().with_span(target.span).into()),
        }
    }

    /// A function expression. A named one sees its own name through an
    /// extra scope between the closure and its defining scope.
    fn eval_function_expr(&mut self, def: FunctionId) -> Value {
        match self.arena.get_function(def).name {
            Some(name) => self.with_env_scope(ScopeKind::Block, |scoped| {
                let closure = scoped.make_closure(def);
                scoped.env.define_local(name, closure.clone());
                closure
            }),
            None => self.make_closure(def),
        }
    }

    /// Close over the current scope.
    pub(crate) fn make_closure(&self, def: FunctionId) -> Value {
        let label = self
            .arena
            .get_function(def)
            .name
            .map(|name| self.interner.lookup(name));
        Value::Function(FunctionValue::new(
            def,
            self.arena.clone(),
            self.env.capture(),
            label,
        ))
    }

    /// Stamp an unlocated runtime fault with `span` and a backtrace.
    pub(crate) fn annotate(&self, action: ControlAction, span: Span) -> ControlAction {
        match action {
            ControlAction::Error(err) if err.span.is_none() => {
                ControlAction::Error(self.call_stack.attach_backtrace(err.with_span(span)))
            }
            other => other,
        }
    }
}
