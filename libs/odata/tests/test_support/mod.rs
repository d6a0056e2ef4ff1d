#![allow(dead_code)]

use ferrum_edm::{
    BagElement, EdmModel, EdmPrimitiveType as Edm, MetadataProvider, ResourceType, SetRights,
};
use ferrum_odata::{
    CompileOptions, Expression, ExpressionCompiler, ExpressionParser, ProcessorOptions, Result,
    ResolverOptions, SegmentChain, SegmentResolver, UriProcessor,
};
use std::sync::{Arc, OnceLock};

static NORTHWIND: OnceLock<Arc<EdmModel>> = OnceLock::new();

/// Northwind-style model shared by the integration tests
pub fn northwind() -> Arc<EdmModel> {
    NORTHWIND
        .get_or_init(|| Arc::new(build_northwind().expect("Failed to build Northwind model")))
        .clone()
}

pub fn metadata() -> Arc<dyn MetadataProvider> {
    northwind()
}

fn build_northwind() -> ferrum_edm::Result<EdmModel> {
    EdmModel::builder()
        .add_type(
            ResourceType::complex("Address")
                .with_namespace("NorthWind")
                .with_primitive("StreetName", Edm::String)
                .with_primitive("LineNumber", Edm::Int32)
                .with_primitive("Country", Edm::String),
        )
        .add_type(
            ResourceType::entity("Customer")
                .with_namespace("NorthWind")
                .with_key("CustomerID", Edm::String)
                .with_primitive("CompanyName", Edm::String)
                .with_primitive("Country", Edm::String)
                .with_primitive("Rating", Edm::Int32)
                .with_primitive("Active", Edm::Boolean)
                .with_primitive("Since", Edm::DateTime)
                .with_complex("Address", "Address")
                .with_collection_reference("Orders", "Order"),
        )
        .add_type(
            ResourceType::entity("Order")
                .with_namespace("NorthWind")
                .with_key("OrderID", Edm::Int32)
                .with_primitive("OrderDate", Edm::DateTime)
                .with_primitive("Price", Edm::Decimal)
                .with_primitive("Freight", Edm::Double)
                .with_primitive("ShipName", Edm::String)
                .with_reference("Customer", "Customer")
                .with_collection_reference("Order_Details", "Order_Detail"),
        )
        .add_type(
            ResourceType::entity("Order_Detail")
                .with_namespace("NorthWind")
                .with_key("ProductID", Edm::Int32)
                .with_key("OrderID", Edm::Int32)
                .with_primitive("UnitPrice", Edm::Decimal)
                .with_primitive("Quantity", Edm::Int16)
                .with_primitive("Discount", Edm::Single)
                .with_reference("Order", "Order"),
        )
        .add_type(
            ResourceType::entity("Product")
                .with_namespace("NorthWind")
                .with_key("ProductID", Edm::Int32)
                .with_primitive("ProductName", Edm::String)
                .with_primitive("ProductGuid", Edm::Guid)
                .with_primitive("Signature", Edm::Binary)
                .with_primitive("Weight", Edm::Single)
                .with_primitive("Stock", Edm::Int64)
                .with_primitive("Code", Edm::Byte),
        )
        .add_type(
            ResourceType::entity("Employee")
                .with_namespace("NorthWind")
                .media_link_entry()
                .with_named_stream("Thumbnail")
                .with_key("EmployeeID", Edm::String)
                .with_primitive("FirstName", Edm::String)
                .with_bag("Emails", BagElement::Primitive(Edm::String))
                .with_bag("Addresses", BagElement::Complex("Address".into()))
                .with_reference("Manager", "Employee")
                .with_collection_reference("Reports", "Employee"),
        )
        .add_entity_set("Customers", "Customer")
        .add_entity_set("Orders", "Order")
        .add_entity_set("Order_Details", "Order_Detail")
        .add_entity_set("Products", "Product")
        .add_entity_set("Secrets", "Product")
        .add_entity_set("Employees", "Employee")
        .add_singleton("Boss", "Employee")
        .add_association("Customers", "Customer", "Orders", "Orders")
        .add_association("Orders", "Order", "Customer", "Customers")
        .add_association("Orders", "Order", "Order_Details", "Order_Details")
        .add_association("Order_Details", "Order_Detail", "Order", "Orders")
        .add_association("Employees", "Employee", "Manager", "Employees")
        .add_association("Employees", "Employee", "Reports", "Employees")
        .add_association("Boss", "Employee", "Manager", "Employees")
        .add_association("Boss", "Employee", "Reports", "Employees")
        .set_rights("Secrets", SetRights::NONE)
        .build()
}

pub fn resource_type(name: &str) -> Arc<ResourceType> {
    northwind()
        .resource_type(name)
        .unwrap_or_else(|| panic!("unknown type {}", name))
}

pub fn filter_parser(type_name: &str, text: &str) -> Result<ExpressionParser> {
    ExpressionParser::new(text, resource_type(type_name), metadata(), true)
}

pub fn parse_filter(type_name: &str, text: &str) -> Result<Expression> {
    filter_parser(type_name, text)?.parse_filter()
}

/// Parse without the Boolean result requirement
pub fn parse_expression(type_name: &str, text: &str) -> Result<Expression> {
    ExpressionParser::new(text, resource_type(type_name), metadata(), false)?.parse_filter()
}

pub fn compile_filter(type_name: &str, text: &str) -> Result<String> {
    let expression = parse_filter(type_name, text)?;
    Ok(ExpressionCompiler::new(&CompileOptions::default()).process_expression(&expression))
}

pub fn segments(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

pub fn resolve(raw: &[&str]) -> Result<SegmentChain> {
    SegmentResolver::new(metadata(), ResolverOptions::default()).resolve(&segments(raw))
}

pub fn processor() -> UriProcessor {
    UriProcessor::new(metadata(), ProcessorOptions::default())
}
