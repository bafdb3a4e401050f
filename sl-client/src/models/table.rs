use std::io::Cursor;

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::StreamReader;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::bail;
use crate::error::{ErrorKind, SlResult};

/// Columnar result of a query, made of one or more Arrow record batches sharing a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl ResultTable {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// Decodes a base64 encoded Arrow IPC stream, the form used by paged metadata results.
    pub fn decode_base64(encoded: &str) -> SlResult<Self> {
        let bytes = BASE64_STANDARD.decode(encoded)?;
        Self::from_ipc_bytes(&bytes)
    }

    /// Decodes a raw Arrow IPC stream.
    pub fn from_ipc_bytes(bytes: &[u8]) -> SlResult<Self> {
        let reader = StreamReader::try_new(Cursor::new(bytes), None)?;
        let schema = reader.schema();
        let batches = reader.collect::<Result<Vec<_>, _>>()?;

        Ok(Self { schema, batches })
    }

    /// Concatenates tables in the given order.
    ///
    /// Every table must have the same fields as the first one.
    pub fn concat<I>(tables: I) -> SlResult<Self>
    where
        I: IntoIterator<Item = ResultTable>,
    {
        let mut tables = tables.into_iter();
        let Some(first) = tables.next() else {
            bail!(ErrorKind::InvalidData, "Cannot concatenate zero tables");
        };

        let schema = first.schema;
        let mut batches = first.batches;
        for (index, table) in tables.enumerate() {
            if table.schema.fields() != schema.fields() {
                bail!(
                    ErrorKind::SchemaMismatch,
                    "Result pages have different schemas",
                    format!(
                        "table {} has schema {:?}, expected {:?}",
                        index + 1,
                        table.schema.fields(),
                        schema.fields()
                    )
                );
            }

            batches.extend(table.batches);
        }

        Ok(Self { schema, batches })
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Merges all batches into a single record batch.
    pub fn to_record_batch(&self) -> SlResult<RecordBatch> {
        Ok(concat_batches(&self.schema, &self.batches)?)
    }
}
