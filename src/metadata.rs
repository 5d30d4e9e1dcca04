//! Zarr V3 metadata for arrays chunked by the solver.
//!
//! The chunk shape is handed to the writer as a `regular` chunk grid;
//! because every chunk extent divides its axis there are no partial edge chunks.

use std::{borrow::Cow, num::NonZeroU64};

use zarrs::{
    array::{
        ArrayMetadataV3, DataType, FillValueMetadata,
        chunk_grid::{RegularChunkGrid, RegularChunkGridConfiguration},
        codec::{BytesCodec, GzipCodec},
        data_type,
    },
    metadata::{Configuration, v3::MetadataV3},
    plugin::{ExtensionAliasesV3, ZarrVersion},
};
use zarrs_codec::{CodecMetadataOptions, CodecTraits};

use crate::{report::ChunkReport, storage_options::StorageOptions};

/// Create regular chunk grid metadata for the given chunk shape.
pub fn chunk_grid_metadata(chunk_shape: &[u64]) -> crate::Result<MetadataV3> {
    let chunk_shape: Vec<_> = chunk_shape
        .iter()
        .map(|&n| {
            NonZeroU64::new(n).ok_or_else(|| crate::Error::configuration("zero chunk extent"))
        })
        .collect::<crate::Result<Vec<_>>>()?;
    let out = MetadataV3::new_with_serializable_configuration(
        RegularChunkGrid::aliases_v3()
            .default_name
            .clone()
            .to_string(),
        &RegularChunkGridConfiguration {
            chunk_shape: chunk_shape.into(),
        },
    )?;
    Ok(out)
}

/// Look up a fixed-size numeric data type by its Zarr V3 name.
pub fn lookup_data_type(name: &str) -> crate::Result<DataType> {
    let data_type = match name {
        "uint8" => data_type::uint8(),
        "int8" => data_type::int8(),
        "int16" => data_type::int16(),
        "uint16" => data_type::uint16(),
        "int32" => data_type::int32(),
        "uint32" => data_type::uint32(),
        "int64" => data_type::int64(),
        "uint64" => data_type::uint64(),
        "float32" => data_type::float32(),
        "float64" => data_type::float64(),
        s => return Err(crate::Error::general(format!("unsupported data type: {s}"))),
    };
    Ok(data_type)
}

/// Width in bytes of a fixed-size data type.
pub fn element_width(data_type: &DataType) -> crate::Result<u64> {
    data_type
        .fixed_size()
        .map(|n| n as u64)
        .ok_or_else(|| crate::Error::general("data type has no fixed element size"))
}

pub fn data_type_metadata(data_type: &DataType) -> MetadataV3 {
    let data_type_name = data_type
        .name_v3()
        .map_or_else(String::new, Cow::into_owned);
    let data_type_configuration = data_type.configuration_v3();
    if data_type_configuration.is_empty() {
        MetadataV3::new(data_type_name)
    } else {
        MetadataV3::new_with_configuration(data_type_name, data_type_configuration)
    }
}

fn codec_metadata(name: String, configuration: Option<Configuration>) -> MetadataV3 {
    match configuration {
        Some(config) => MetadataV3::new_with_configuration(name, config),
        None => MetadataV3::new(name),
    }
}

/// Little-endian bytes codec, followed by gzip if the options ask for compression.
///
/// Shuffling is not part of the codec chain; see [array_metadata].
pub fn codec_chain_metadata(options: &StorageOptions) -> crate::Result<Vec<MetadataV3>> {
    let version = ZarrVersion::V3;
    let codec_options = CodecMetadataOptions::default();

    let bytes = BytesCodec::little();
    let mut out = vec![codec_metadata(
        BytesCodec::aliases_v3().default_name.clone().to_string(),
        bytes.configuration(version, &codec_options),
    )];
    if let Some(gzip) = options.gzip_codec()? {
        out.push(codec_metadata(
            GzipCodec::aliases_v3().default_name.clone().to_string(),
            gzip.configuration(version, &codec_options),
        ));
    }
    Ok(out)
}

fn convert_fill_value() -> FillValueMetadata {
    FillValueMetadata::Number(serde_json::Number::from(0))
}

/// Solve the chunk shape for an array and describe it as Zarr V3 array metadata.
///
/// The element width is taken from `word_size` if configured,
/// otherwise from the data type.
/// A requested shuffle filter is recorded in the `shuffle` attribute for the writer.
pub fn array_metadata(
    shape: &[u64],
    data_type_name: &str,
    options: &StorageOptions,
) -> crate::Result<(ArrayMetadataV3, ChunkReport)> {
    options.validate()?;
    let data_type = lookup_data_type(data_type_name)?;
    let width = element_width(&data_type)?;
    let (chunk_shape, report) = options.solver(Some(width)).compute_with_report(shape)?;

    let chunk_grid = chunk_grid_metadata(&chunk_shape)?;
    let codecs = codec_chain_metadata(options)?;

    let mut attributes = serde_json::Map::new();
    if options.shuffle {
        log::info!("shuffle requested; recording it as an attribute for the writer");
        attributes.insert("shuffle".into(), serde_json::Value::Bool(true));
    }

    let out = ArrayMetadataV3::new(
        shape.to_vec(),
        chunk_grid,
        data_type_metadata(&data_type),
        convert_fill_value(),
        codecs,
    )
    .with_attributes(attributes);
    Ok((out, report))
}
