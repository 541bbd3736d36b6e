//! Parallel validation of many inputs against one schema.

use rayon::prelude::*;
use serde_json::Value;

use crate::context::{ValidateOptions, ValidationContext};
use crate::schema::SimpleSchema;

impl SimpleSchema {
    /// Validates each input in its own context, in parallel.
    ///
    /// The returned contexts are in input order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use docschema::{FieldRule, SimpleSchema, ValidateOptions};
    /// use serde_json::json;
    ///
    /// let schema = SimpleSchema::new([("n", FieldRule::integer())]).unwrap();
    /// let inputs = vec![json!({"n": 1}), json!({}), json!({"n": 2})];
    ///
    /// let results = schema.validate_batch(&inputs, ValidateOptions::document());
    /// let valid: Vec<bool> = results.iter().map(|c| c.is_valid()).collect();
    /// assert_eq!(valid, vec![true, false, true]);
    /// ```
    pub fn validate_batch(
        &self,
        inputs: &[Value],
        options: ValidateOptions,
    ) -> Vec<ValidationContext<'_>> {
        inputs
            .par_iter()
            .map(|input| {
                let mut context = self.new_context();
                context.validate(input, options);
                context
            })
            .collect()
    }

    /// Cleans each input in parallel, keeping input order.
    pub fn clean_batch(&self, inputs: &[Value]) -> Vec<Value> {
        inputs.par_iter().map(|input| self.clean(input)).collect()
    }
}
