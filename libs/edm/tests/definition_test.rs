//! Loading models from JSON definitions

use ferrum_edm::{
    AccessRight, BagElement, EdmModel, EdmPrimitiveType, Error, MetadataProvider, PropertyKind,
};

const MODEL: &str = r#"{
  "namespace": "NorthWind",
  "types": [
    { "name": "Address", "kind": "complex", "properties": [
      { "name": "StreetName", "kind": "primitive", "type": "Edm.String" },
      { "name": "LineNumber", "kind": "primitive", "type": "Edm.Int32" }
    ]},
    { "name": "Customer", "kind": "entity", "properties": [
      { "name": "CustomerID", "kind": "primitive", "type": "Edm.String", "key": true },
      { "name": "Address", "kind": "complex", "type": "Address" },
      { "name": "Orders", "kind": "collection", "type": "Order" }
    ]},
    { "name": "PreferredCustomer", "kind": "entity", "baseType": "Customer", "properties": [
      { "name": "Discount", "kind": "primitive", "type": "Edm.Decimal" }
    ]},
    { "name": "Order", "kind": "entity", "properties": [
      { "name": "OrderID", "kind": "primitive", "type": "Edm.Int32", "key": true },
      { "name": "Customer", "kind": "reference", "type": "Customer" }
    ]},
    { "name": "Employee", "kind": "entity", "mediaLinkEntry": true,
      "namedStreams": ["Thumbnail"], "properties": [
      { "name": "EmployeeID", "kind": "primitive", "type": "Edm.String", "key": true },
      { "name": "Emails", "kind": "bag", "elementType": "Edm.String" }
    ]}
  ],
  "entitySets": [
    { "name": "Customers", "type": "Customer" },
    { "name": "Orders", "type": "Order" },
    { "name": "Employees", "type": "Employee" }
  ],
  "singletons": [{ "name": "Boss", "type": "Employee" }],
  "associations": [
    { "source": "Customers", "sourceType": "Customer", "property": "Orders", "target": "Orders" },
    { "source": "Orders", "sourceType": "Order", "property": "Customer", "target": "Customers" }
  ],
  "rights": [{ "entitySet": "Employees", "readSingle": true }]
}"#;

#[test]
fn test_load_model_from_json() {
    let model = EdmModel::from_json(MODEL).unwrap();

    let customer = model.resource_type("Customer").unwrap();
    assert_eq!(customer.full_name(), "NorthWind.Customer");
    assert!(model.resource_type("NorthWind.Customer").is_some());

    let keys = model.key_properties(&customer);
    assert_eq!(keys.len(), 1);
    assert_eq!(&*keys[0].name, "CustomerID");
    assert!(!keys[0].nullable);
}

#[test]
fn test_inherited_properties_and_keys() {
    let model = EdmModel::from_json(MODEL).unwrap();
    let preferred = model.resource_type("PreferredCustomer").unwrap();

    let keys = model.key_properties(&preferred);
    assert_eq!(keys.len(), 1);
    assert_eq!(&*keys[0].name, "CustomerID");

    assert!(model.property(&preferred, "Address").is_some());
    assert!(model.property(&preferred, "Discount").is_some());

    let names: Vec<String> = model
        .all_properties(&preferred)
        .iter()
        .map(|p| p.name.to_string())
        .collect();
    assert_eq!(names, vec!["CustomerID", "Address", "Orders", "Discount"]);

    let customer = model.resource_type("Customer").unwrap();
    let derived = model.derived_types(&customer);
    assert_eq!(derived.len(), 1);
    assert_eq!(&*derived[0].name, "PreferredCustomer");
}

#[test]
fn test_bags_streams_and_rights() {
    let model = EdmModel::from_json(MODEL).unwrap();
    let employee = model.resource_type("Employee").unwrap();

    let emails = model.property(&employee, "Emails").unwrap();
    assert_eq!(
        emails.kind,
        PropertyKind::Bag(BagElement::Primitive(EdmPrimitiveType::String))
    );
    assert!(model.is_media_link_entry(&employee));
    assert!(model.has_named_stream(&employee, "Thumbnail"));

    let employees = model.container_item("Employees").unwrap();
    assert!(model.check_rights(&employees, AccessRight::ReadSingle));
    assert!(!model.check_rights(&employees, AccessRight::ReadMultiple));

    assert!(model.container_item("Boss").is_some());
}

#[test]
fn test_inherited_navigation_uses_declared_association() {
    let model = EdmModel::from_json(MODEL).unwrap();
    let customers = model.container_item("Customers").unwrap();
    let preferred = model.resource_type("PreferredCustomer").unwrap();
    let orders = model.property(&preferred, "Orders").unwrap();

    let target = model
        .association_target(&customers, &preferred, &orders)
        .unwrap();
    assert_eq!(&*target.name, "Orders");
}

#[test]
fn test_invalid_json_is_reported() {
    let result = EdmModel::from_json("{ \"types\": 3 }");
    assert!(matches!(result, Err(Error::JsonError(_))));
}
