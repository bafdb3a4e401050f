use std::sync::Arc;

use arrow::array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::StreamWriter;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

/// Builds a batch with an `id: Int64` and a `name: Utf8` column.
pub fn id_name_batch(ids: &[i64], names: &[&str]) -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
    ]);

    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(ids.to_vec())),
            Arc::new(StringArray::from(names.to_vec())),
        ],
    )
    .expect("failed to build id/name batch")
}

/// Builds a batch with an `id: Int64` and a `value: Float64` column.
pub fn id_value_batch(ids: &[i64], values: &[f64]) -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("value", DataType::Float64, true),
    ]);

    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(ids.to_vec())),
            Arc::new(Float64Array::from(values.to_vec())),
        ],
    )
    .expect("failed to build id/value batch")
}

/// Encodes a batch as an Arrow IPC stream.
pub fn encode_ipc(batch: &RecordBatch) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buffer, &batch.schema())
            .expect("failed to create IPC writer");
        writer.write(batch).expect("failed to write batch");
        writer.finish().expect("failed to finish IPC stream");
    }

    buffer
}

/// Encodes a batch as a base64 Arrow IPC stream, the form paged results carry.
pub fn encode_base64(batch: &RecordBatch) -> String {
    BASE64_STANDARD.encode(encode_ipc(batch))
}

/// Builds the encoded page holding rows `ids`, named `row-{id}`.
pub fn encoded_page(ids: &[i64]) -> String {
    let names: Vec<String> = ids.iter().map(|id| format!("row-{id}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    encode_base64(&id_name_batch(ids, &names))
}

/// Returns the `id` column of every row of `batches`, in order.
pub fn ids(batches: &[RecordBatch]) -> Vec<i64> {
    batches
        .iter()
        .flat_map(|batch| {
            batch
                .column(0)
                .as_any()
                .downcast_ref::<Int64Array>()
                .expect("first column is not an Int64 column")
                .values()
                .to_vec()
        })
        .collect()
}
