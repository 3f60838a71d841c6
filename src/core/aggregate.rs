use crate::domain::model::{AggregateTable, Record, Schema};

/// Append-only, column-oriented accumulation of card records.
pub struct Aggregator {
    schema: Schema,
    columns: Vec<Vec<String>>,
    rows: usize,
}

impl Aggregator {
    pub fn new(schema: Schema) -> Self {
        let columns = vec![Vec::new(); schema.len()];
        Self {
            schema,
            columns,
            rows: 0,
        }
    }

    /// 每個欄位各推入一個值，缺少的欄位補空字串，確保各欄長度一致
    pub fn append(&mut self, record: Record) {
        let mut row = vec![String::new(); self.schema.len()];
        for (field, value) in record.into_entries() {
            if let Some(idx) = self.schema.position(&field) {
                row[idx] = value;
            }
        }

        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
        self.rows += 1;
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn finalize(self) -> AggregateTable {
        AggregateTable {
            schema: self.schema,
            columns: self.columns,
            rows: self.rows,
        }
    }
}
