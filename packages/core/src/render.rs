//! Renders a [`MetadataStore`] into the generated reflection translation unit.

use crate::classifier::{FIXED_STRING_TEMPLATE, SEQUENCE_TEMPLATE};
use crate::emitter::CodeWriter;
use crate::store::{FieldKind, MetadataStore, TypeRecord};

/// Comment that opens and closes every generated file
pub const GENERATED_MARKER: &str = "/*\tWRITTEN BY HEART-CODEGEN\t*/";
pub const CORE_HEADER: &str = "gen/gen.h";
pub const DESERIALIZATION_HEADER: &str = "heart/deserialization.h";
pub const REGISTRATION_FUNCTION: &str = "void ReflectSerializedData()";

/// Capacity of `SerializedDataPath`; always registered. Must match
/// `SerializedDataPathSize` in heart-core's codegen.h.
pub const SERIALIZED_DATA_PATH_SIZE: u32 = 64;

/// Primitive types in registration order with the types each converts to
const PRIMITIVE_TYPES: &[(&str, &[&str])] = &[
    ("int8_t", &[]),
    ("uint8_t", &[]),
    ("int16_t", &[]),
    ("uint16_t", &[]),
    ("int32_t", &["uint32_t", "uint16_t", "uint8_t"]),
    ("uint32_t", &["int32_t", "int16_t", "int8_t"]),
    ("int64_t", &[]),
    ("uint64_t", &[]),
    ("bool", &[]),
    ("float", &[]),
    ("double", &[]),
];

fn begin_end(ty: &str) -> (String, Option<String>) {
    (
        format!("BEGIN_SERIALIZE_TYPE({ty})"),
        Some(format!("END_SERIALIZE_TYPE({ty})")),
    )
}

fn begin_additive(ty: &str) -> (String, Option<String>) {
    (
        format!("BEGIN_SERIALIZE_TYPE_ADDITIVE({ty})"),
        Some(format!("END_SERIALIZE_TYPE({ty})")),
    )
}

fn fixed_string(capacity: u32) -> String {
    format!("{FIXED_STRING_TEMPLATE}<{capacity}>")
}

/// Render the whole generated file
pub fn render(store: &MetadataStore) -> String {
    let mut writer = CodeWriter::new();

    writer.line(GENERATED_MARKER);
    writer.blank();

    write_header(&mut writer, store);

    {
        let mut function = writer.block(REGISTRATION_FUNCTION);
        write_primitive_types(&mut function);
        write_fixed_strings(&mut function, store);
        write_sequences(&mut function, store);
        for record in store.types() {
            write_type(&mut function, record);
            function.blank();
        }
    }

    writer.blank();
    writer.line(GENERATED_MARKER);

    writer.finish()
}

fn write_header(writer: &mut CodeWriter, store: &MetadataStore) {
    writer.line(format!("#include \"{CORE_HEADER}\""));
    writer.line(format!("#include <{DESERIALIZATION_HEADER}>"));
    writer.blank();
    for include in &store.includes {
        writer.line(format!("#include \"{include}\""));
    }
    writer.blank();

    writer.line("template <typename T>");
    writer.line("void ReflectionSet(T& prop, T value)");
    writer.scope("{", Some("}".to_string())).line("prop = value;");
    writer.blank();

    writer.line("template <typename T>");
    writer.line("T ReflectionGet(T& prop)");
    writer.scope("{", Some("}".to_string())).line("return prop;");
    writer.blank();
}

fn write_self_access(writer: &mut CodeWriter, ty: &str) {
    writer.line(format!(
        "SERIALIZE_SELF_ACCESS({ty}, &ReflectionSet<{ty}>, &ReflectionGet<{ty}>)"
    ));
}

fn write_primitive_types(writer: &mut CodeWriter) {
    for (ty, conversions) in PRIMITIVE_TYPES {
        {
            let (open, close) = begin_end(ty);
            let mut block = writer.scope(open, close);
            write_self_access(&mut block, ty);
            for target in conversions.iter() {
                block.line(format!("SERIALIZE_CONVERSION({ty}, {target})"));
            }
        }
        writer.blank();
    }
}

fn write_fixed_strings(writer: &mut CodeWriter, store: &MetadataStore) {
    let mut capacities = store.aux.string_capacities.clone();
    capacities.insert(SERIALIZED_DATA_PATH_SIZE);

    {
        let (open, close) = begin_additive("const char*");
        let mut block = writer.scope(open, close);
        for capacity in &capacities {
            block.line(format!(
                "SERIALIZE_CONVERSION(const char*, &{}::CreateFromCString)",
                fixed_string(*capacity)
            ));
        }
    }
    writer.blank();

    for capacity in &capacities {
        let ty = fixed_string(*capacity);
        {
            let (open, close) = begin_additive(&ty);
            let mut block = writer.scope(open, close);
            write_self_access(&mut block, &ty);
        }
        writer.blank();
    }
}

fn write_sequences(writer: &mut CodeWriter, store: &MetadataStore) {
    for element in &store.aux.sequence_elements {
        let ty = format!("{SEQUENCE_TEMPLATE}<{element}>");
        {
            let (open, close) = begin_end(&ty);
            let mut block = writer.scope(open, close);
            block.line(format!("SERIALIZE_FUNCTION_ALIAS({ty}, emplace_back<>)"));
            block.line(format!("SERIALIZE_FUNCTION_ALIAS({ty}, reserve)"));
        }
        writer.blank();
    }
}

/// One reflected type's registration block
pub fn write_type(writer: &mut CodeWriter, record: &TypeRecord) {
    let ty = &record.name;
    let (open, close) = begin_end(ty);
    let mut block = writer.scope(open, close);
    for field in &record.fields {
        let name = &field.name;
        match field.kind {
            FieldKind::Method => block.line(format!("SERIALIZE_FUNCTION({ty}, {name})")),
            FieldKind::AliasRef => block.line(format!("SERIALIZE_FIELD_ALIAS({ty}, {name})")),
            FieldKind::Plain => block.line(format!("SERIALIZE_FIELD({ty}, {name})")),
        }
    }
}
