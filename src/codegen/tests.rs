use super::overload::{self, CallSite};
use super::shape::{c_proto, ffi_decl, stub_c_proto, stub_ffi_sig, ShimKind};
use super::*;
use crate::emit::{render, Style};
use crate::model::{ClassDecl, Func, Implementation, ModelFile, ModelOptions, Param, Type};

fn params(types: &[Type]) -> Vec<Param> {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| Param::new(&format!("p{i}"), ty.clone()))
        .collect()
}

fn java_model() -> Model {
    let mut stream = ClassDecl::new("java.io.InputStream");
    stream.supers = vec!["java.lang.Object".to_string()];
    stream.methods = vec![
        Func::new("read", vec![], Some(Type::I32)).with_sig("()I").throwing(),
        Func::new("read", params(&[Type::Bytes]), Some(Type::I32))
            .with_sig("([B)I")
            .throwing(),
        Func::new("set", params(&[Type::I32]), None),
        Func::new("set", params(&[Type::I32, Type::String]), None),
        Func::new("set", params(&[Type::I32, Type::I64]), Some(Type::I32)),
        Func::new("toString", vec![], Some(Type::String)).with_sig("()Ljava/lang/String;"),
    ];
    stream.funcs = vec![Func::new("<init>", vec![], None).with_sig("()V").into_constructor()];

    let file = ModelFile {
        runtime: Runtime::Java,
        classes: vec![ClassDecl::new("java.lang.Object"), stream],
        implementations: vec![Implementation {
            rust_type: "crate::streams::Counting".to_string(),
            class: "java.io.InputStream".to_string(),
            name: None,
        }],
    };
    Model::new(file, &ModelOptions::default()).unwrap()
}

fn objc_model() -> Model {
    let error = Param {
        name: "error".to_string(),
        ty: Type::Indirect(Box::new(Type::object("NSError"))),
        decl: Some("NSError * _Nullable *".to_string()),
    };
    let mut data = ClassDecl::new("NSData");
    data.module = Some("Foundation".to_string());
    data.methods = vec![
        Func::new("writeToFile", vec![Param::new("path", Type::String), error], Some(Type::Bool))
            .with_sig("writeToFile:error:"),
        Func::new("length", vec![], Some(Type::ULong)).with_sig("length"),
    ];
    let file = ModelFile {
        runtime: Runtime::Objc,
        classes: vec![data],
        implementations: vec![],
    };
    Model::new(file, &ModelOptions::default()).unwrap()
}

fn proxy_site(class: &Class) -> CallSite<'_> {
    CallSite {
        runtime: Runtime::Java,
        class,
        kind: ShimKind::Proxy,
        receiver: "self.bind_proxy_refnum()",
    }
}

#[test]
fn test_signature_variadic_tail() {
    let model = java_model();
    let class = model.class("java.io.InputStream").unwrap();
    let read = class.method("read").unwrap();
    assert_eq!(
        overload::signature(read, true),
        "fn read(&self, a0: &[&[u8]]) -> Result<i32, ForeignError>"
    );

    let set = class.method("set").unwrap();
    assert_eq!(overload::signature(set, true), "fn set(&self, a0: i32, a1: &[Value]) -> Value");
}

#[test]
fn test_body_dispatches_by_arity() {
    let model = java_model();
    let class = model.class("java.io.InputStream").unwrap();
    let read = class.method("read").unwrap();
    let text = render(&overload::body(read, &proxy_site(class)), &Style::rust());

    assert!(text.starts_with("match 0 + a0.len() {\n"));
    assert!(text.contains(
        "    0 => {\n        let res = unsafe { cproxy_java_io_InputStream_read__(self.bind_proxy_refnum()) };\n"
    ));
    assert!(text.contains("let __a0_view = NByteSlice::view(a0[0]);"));
    assert!(text.contains("call::check(res.exc)?;"));
    assert!(text.contains("return Ok(_res);"));
    assert!(text.contains("    _ => {}\n"));
    assert!(text.ends_with("call::no_overload_matched(\"java.io.InputStream\", \"read\")\n"));
}

#[test]
fn test_body_split_bucket_in_declaration_order() {
    let model = java_model();
    let class = model.class("java.io.InputStream").unwrap();
    let set = class.method("set").unwrap();
    let text = render(&overload::body(set, &proxy_site(class)), &Style::rust());

    let string = text.find("if let Some(_a1) = a1[0].as_str() {").unwrap();
    let long = text.find("if let Some(_a1) = a1[0].as_i64() {").unwrap();
    assert!(string < long);
    assert!(text.contains("let __a1 = NString16::encode(_a1);"));
    assert!(text.contains("call::fault_on_exception(res);"));
    assert!(text.contains("call::fault_on_exception(res.exc);"));
    // Variants without a value return the placeholder
    assert!(text.contains("return Value::Null;"));
    assert!(text.contains("return Value::from(_res);"));

    // Arities 1 and 2, the second split between two variants; a two-argument
    // call matching neither faults with the class and method
    assert!(text.starts_with("match 1 + a1.len() {\n"));
    assert!(text.contains("    1 => {\n"));
    assert!(text.contains("    2 => {\n"));
    assert!(text.ends_with("call::no_overload_matched(\"java.io.InputStream\", \"set\")\n"));
}

#[test]
fn test_single_variant_has_no_fallback() {
    let model = java_model();
    let class = model.class("java.io.InputStream").unwrap();
    let to_string = class.method("toString").unwrap();
    let text = render(&overload::body(to_string, &proxy_site(class)), &Style::rust());

    assert!(!text.contains("no_overload_matched"));
    assert!(!text.contains("return"));
    assert!(text.contains("let _res = unsafe { res.res.decode() };"));
    assert!(text.ends_with("_res\n"));
}

#[test]
fn test_shim_declarations_agree() {
    let model = java_model();
    let class = model.class("java.io.InputStream").unwrap();
    let read = &class.method("read").unwrap().funcs[1];

    assert_eq!(
        ffi_decl(Runtime::Java, ShimKind::Super, class, read),
        "fn csuper_java_io_InputStream_read___3B(this: Handle, a0: NByteSlice) -> Ret<i32>;"
    );
    assert_eq!(
        c_proto(Runtime::Java, ShimKind::Super, class, read),
        "ret_jint csuper_java_io_InputStream_read___3B(jint this, nbyteslice a0)"
    );

    let ctor = &class.funcs[0].funcs[0];
    assert_eq!(
        c_proto(Runtime::Java, ShimKind::Static, class, ctor),
        "ret_jint cproxy_s_java_io_InputStream__new(void)"
    );
}

#[test]
fn test_java_output_files() {
    let model = java_model();
    let output = generate(&model, &Options::default());
    let paths: Vec<&str> = output.paths().collect();
    assert_eq!(
        paths,
        vec![
            "classes.c",
            "classes.h",
            "java/java/io.rs",
            "java/java/io/InputStream.rs",
            "java/java/lang.rs",
            "java/java/lang/Object.rs",
            "java/mod.rs",
            "java_interfaces.rs",
            "java_proxies.rs",
        ]
    );
    assert!(output.paths().all(|p| output.get(p).unwrap().starts_with(HEADER)));
}

#[test]
fn test_java_native_source() {
    let model = java_model();
    let output = JavaGenerator::new(&model, &Options::default()).generate();
    let header = output.get("classes.h").unwrap();
    let source = output.get("classes.c").unwrap();

    assert!(header.contains("typedef struct ret_nstring {\n\tnstring res;\n\tjint exc;\n} ret_nstring;"));
    assert!(header.contains("extern ret_jint cproxy_java_io_InputStream_read__(jint this);"));
    assert!(header.contains("extern ret_jint csuper_java_io_InputStream_read__(jint this);"));

    assert!(source.contains("static jclass sclass_java_io_InputStream;"));
    assert!(source.contains(
        "\t\tm_java_io_InputStream_read___3B = seqbind_get_method_id(clazz, \"read\", \"([B)I\");"
    ));
    assert!(source.contains(
        "\t\tm_s_java_io_InputStream__new = seqbind_get_method_id(clazz, \"<init>\", \"()V\");"
    ));
    assert!(source.contains("jbyteArray _a0 = seqbind_to_java_bytearray(env, a0, 0);"));
    assert!(source.contains(
        "jint res = (*env)->CallNonvirtualIntMethod(env, _this, sclass_java_io_InputStream, sm_java_io_InputStream_read___3B, _a0);"
    ));
    assert!(source.contains("nstring _res = seqbind_from_java_string(env, res);"));
    assert!(source.contains("jobject res = (*env)->NewObject(env, class_java_io_InputStream, m_s_java_io_InputStream__new);"));
    // Receiver plus one argument
    assert!(source.contains(
        "ret_jint cproxy_java_io_InputStream_read___3B(jint this, nbyteslice a0) {\n\tJNIEnv *env = seqbind_push_local_frame(2);"
    ));
}

#[test]
fn test_java_managed_source() {
    let model = java_model();
    let output = generate(&model, &Options::default());
    let interfaces = output.get("java_interfaces.rs").unwrap();
    let proxies = output.get("java_proxies.rs").unwrap();
    let package = output.get("java/java/io/InputStream.rs").unwrap();

    assert!(interfaces.contains("pub trait JavaIoInputStream {"));
    assert!(interfaces.contains("    fn read(&self, a0: &[&[u8]]) -> Result<i32, ForeignError>;"));

    assert!(proxies.contains("    fn init_proxies();"));
    assert!(proxies.contains("pub struct JavaIoInputStreamProxy(pub Arc<Ref>);"));
    assert!(proxies.contains("impl JavaIoInputStream for JavaIoInputStreamSuper {"));
    assert!(proxies.contains("pub fn unwrap(&self) -> Option<ObjectRef> {"));
    assert!(proxies.contains("pub mod java_io_inputstream {"));
    assert!(proxies.contains("\n    register_counting();\n"));
    assert!(proxies.contains(
        "stubs.register(\"Counting\", \"read\", Signature::new(vec![Expect::Kind(ValueKind::Bytes)]), |receiver, args| {"
    ));
    assert!(proxies.contains("let this = receiver.downcast::<crate::streams::Counting>()?;"));
    assert!(proxies.contains("Ok(Value::from(crate::java_interfaces::JavaIoInputStream::read(this, &tail)?))"));
    assert!(!proxies.contains("map_or(Value::Null"));

    assert!(package.contains("pub use crate::java_proxies::java_io_inputstream::*;"));
    let io = output.get("java/java/io.rs").unwrap();
    assert!(io.contains("pub use crate::java_interfaces::JavaIoInputStream as InputStream;"));
}

#[test]
fn test_supers_only_for_implemented_classes() {
    let model = java_model();
    let object = model.class("java.lang.Object").unwrap();
    assert!(!has_super(&model, &Options::default(), object));

    let options = Options {
        all_supers: true,
        ..Options::default()
    };
    assert!(has_super(&model, &options, object));
}

#[test]
fn test_objc_error_shim() {
    let model = objc_model();
    let output = ObjcGenerator::new(&model, &Options::default()).generate();
    let header = output.get("interfaces.h").unwrap();
    let source = output.get("interfaces.m").unwrap();

    assert!(header.contains("@import Foundation;"));
    assert!(header.contains("typedef struct ret_unsigned_long {"));
    assert!(header.contains("extern int cproxy_NSData_writeToFile(int this, nstring a0);"));
    assert!(header.contains("extern unsigned long cproxy_NSData_length(int this);"));

    assert!(source.starts_with(HEADER));
    assert!(source.contains("\t@autoreleasepool {\n\t\tNSData *_this = seqbind_from_refnum(this);"));
    assert!(source.contains(
        "BOOL res = ((BOOL (*)(id, SEL, NSString *, NSError **))objc_msgSend)(_this, @selector(writeToFile:error:), _a0, &err);"
    ));
    assert!(source.contains("if (!res && err != nil) {"));
    assert!(source.contains("return __err;"));
    assert!(!source.contains("csuper_"));
}

#[test]
fn test_objc_managed_source() {
    let model = objc_model();
    let output = generate(&model, &Options::default());
    let interfaces = output.get("objc_interfaces.rs").unwrap();
    let proxies = output.get("objc_proxies.rs").unwrap();

    assert!(interfaces.contains("    fn write_to_file(&self, a0: &str) -> Result<(), ForeignError>;"));
    assert!(interfaces.contains("    fn length(&self) -> usize;"));
    assert!(proxies.contains("fn cproxy_NSData_writeToFile(this: Handle, a0: NString) -> Handle;"));
    assert!(proxies.contains("let __a0 = NString::encode(a0);"));
    assert!(!proxies.contains("init_proxies"));
    assert!(output.get("objc/Foundation/NSData.rs").is_some());
    assert!(output.get("objc/Foundation.rs").is_some());
}

#[test]
fn test_output_write_to() {
    let model = java_model();
    let output = generate(&model, &Options::default());
    let dir = tempfile::tempdir().unwrap();
    output.write_to(dir.path()).unwrap();

    let written = std::fs::read_to_string(dir.path().join("java/java/io/InputStream.rs")).unwrap();
    assert_eq!(Some(written.as_str()), output.get("java/java/io/InputStream.rs"));
    assert!(dir.path().join("classes.c").is_file());
}

#[test]
fn test_stub_statements_propagate_errors() {
    let model = java_model();
    let output = generate(&model, &Options::default());
    let proxies = output.get("java_proxies.rs").unwrap();

    // Non-throwing sets pass their value through, throwing ones use `?`
    assert!(proxies.contains("Ok(Value::from(crate::java_interfaces::JavaIoInputStream::to_string_(this)))"));
    assert!(proxies.contains(
        "Ok(Value::from(crate::java_interfaces::JavaIoInputStream::set(this, args[0].as_i32().unwrap_or_default(), &args[1..])))"
    ));
    assert!(proxies.contains("Ok(Value::from(crate::java_interfaces::JavaIoInputStream::read(this, &tail)?))"));
}

#[test]
fn test_stub_entry_points() {
    let model = java_model();
    let class = model.class("java.io.InputStream").unwrap();
    let imp = &model.implementations[0];
    let read = &class.method("read").unwrap().funcs[1];

    assert_eq!(
        stub_ffi_sig(Runtime::Java, imp, read),
        "pub extern \"C\" fn cstub_Counting_read___3B(this: Handle, a0: NByteSlice) -> Ret<i32>"
    );
    assert_eq!(
        stub_c_proto(Runtime::Java, imp, read),
        "ret_jint cstub_Counting_read___3B(jint this, nbyteslice a0)"
    );

    let output = generate(&model, &Options::default());
    let header = output.get("classes.h").unwrap();
    let proxies = output.get("java_proxies.rs").unwrap();
    assert!(header.contains("extern ret_jint cstub_Counting_read___3B(jint this, nbyteslice a0);"));
    assert!(header.contains("extern ret_nstring cstub_Counting_toString(jint this);"));

    let entry = proxies
        .split("#[no_mangle]\n")
        .find(|chunk| chunk.starts_with("pub extern \"C\" fn cstub_Counting_read___3B("))
        .unwrap();
    assert!(entry.contains("let args: [Value; 1] = [Value::from(unsafe { a0.copy_to_vec() })];"));
    assert!(entry.contains("match stubs::global().invoke(this, \"Counting\", \"read\", &args) {"));
    assert!(entry.contains("let _res = res.as_i32().unwrap_or_default();"));
    assert!(entry.contains("Ret::ok(__res)"));
    assert!(entry.contains("Err(err) => Ret::raised(stubs::exception(err)),"));

    let to_string = proxies
        .split("#[no_mangle]\n")
        .find(|chunk| chunk.starts_with("pub extern \"C\" fn cstub_Counting_toString(this: Handle) -> Ret<NString16> {"))
        .unwrap();
    assert!(to_string.contains("let args: [Value; 0] = [];"));
    assert!(to_string.contains("let __res = NString16::encode(_res);"));
}

#[test]
fn test_objc_stub_entry_points_carry_exceptions() {
    let mut data = ClassDecl::new("NSData");
    data.module = Some("Foundation".to_string());
    data.methods = vec![
        Func::new("length", vec![], Some(Type::ULong)).with_sig("length"),
        Func::new("reset", vec![], None).with_sig("reset"),
    ];
    let file = ModelFile {
        runtime: Runtime::Objc,
        classes: vec![data],
        implementations: vec![Implementation {
            rust_type: "crate::blobs::Blob".to_string(),
            class: "NSData".to_string(),
            name: Some("GoBlob".to_string()),
        }],
    };
    let model = Model::new(file, &ModelOptions::default()).unwrap();
    let output = generate(&model, &Options::default());
    let header = output.get("interfaces.h").unwrap();
    let proxies = output.get("objc_proxies.rs").unwrap();

    // The proxy shim cannot fail, the stub entry point can
    assert!(header.contains("extern unsigned long cproxy_NSData_length(int this);"));
    assert!(header.contains("extern ret_unsigned_long cstub_GoBlob_length(int this);"));
    assert!(header.contains("extern int cstub_GoBlob_reset(int this);"));
    assert!(proxies.contains("pub extern \"C\" fn cstub_GoBlob_length(this: Handle) -> Ret<usize> {"));
    assert!(proxies.contains("pub extern \"C\" fn cstub_GoBlob_reset(this: Handle) -> Handle {"));
    assert!(proxies.contains("Ok(_) => NULL_HANDLE,"));
    assert!(proxies.contains("Err(err) => stubs::exception(err),"));

    // Stubs for sets without a value
    assert!(proxies.contains("let this = receiver.downcast::<crate::blobs::Blob>()?;"));
    assert!(proxies.contains("crate::objc_interfaces::FoundationNSData::reset(this);\n        Ok(Value::Null)\n"));
}

#[test]
fn test_object_guards_match_stub_expectations() {
    let mut integer = ClassDecl::new("java.lang.Integer");
    integer.supers = vec!["java.lang.Object".to_string()];
    let mut list = ClassDecl::new("java.util.List");
    list.supers = vec!["java.lang.Object".to_string()];
    list.methods = vec![
        Func::new("add", vec![Param::new("e", Type::object("java.lang.Integer"))], Some(Type::Bool))
            .with_sig("(Ljava/lang/Integer;)Z"),
        Func::new("add", vec![Param::new("e", Type::object("java.lang.Object"))], Some(Type::Bool))
            .with_sig("(Ljava/lang/Object;)Z"),
    ];
    let file = ModelFile {
        runtime: Runtime::Java,
        classes: vec![ClassDecl::new("java.lang.Object"), integer, list],
        implementations: vec![Implementation {
            rust_type: "crate::lists::Tally".to_string(),
            class: "java.util.List".to_string(),
            name: None,
        }],
    };
    let model = Model::new(file, &ModelOptions::default()).unwrap();
    let class = model.class("java.util.List").unwrap();
    let add = class.method("add").unwrap();
    assert_eq!(overload::signature(add, true), "fn add(&self, a0: Option<ObjectRef>) -> bool");

    // Managed call: narrow to Integer first, the Object variant takes the rest
    let body = render(&overload::body(add, &proxy_site(class)), &Style::rust());
    let narrowed = body.find("if let Some(_a0) = marshal::narrow(&a0, \"java.lang.Integer\") {").unwrap();
    let widest = body.find("cproxy_java_util_List_add__Ljava_lang_Object_2").unwrap();
    assert!(narrowed < widest);
    assert!(!body.contains("marshal::narrow(&a0, \"java.lang.Object\")"));

    // Foreign call: the same order and the same class tests
    let output = generate(&model, &Options::default());
    let proxies = output.get("java_proxies.rs").unwrap();
    let integer = proxies
        .find("stubs.register(\"Tally\", \"add\", Signature::new(vec![Expect::object(\"java.lang.Integer\")]), |receiver, args| {")
        .unwrap();
    let object = proxies
        .find("stubs.register(\"Tally\", \"add\", Signature::new(vec![Expect::object(\"java.lang.Object\")]), |receiver, args| {")
        .unwrap();
    assert!(integer < object);
    assert!(proxies.contains("crate::java_interfaces::JavaUtilList::add(this, args[0].object_of(\"java.lang.Object\").flatten())"));
    assert!(proxies.contains("let args: [Value; 1] = [Value::from(ObjectRef::from_refnum(a0))];"));
}
