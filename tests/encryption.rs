// tests/encryption.rs: the standard security handler against a real
// encrypted file: authentication, string decryption, stream decryption.

mod common;

use common::TestPdf;
use pretty_assertions::assert_eq;
use readpdf::encryption::{compute_o, compute_u_for_password, SecurityHandler};
use readpdf::{
    Dictionary, Error, Object, PdfDocument, RecordingSink, RenderOptions, Stream, StringFormat,
};

const FILE_ID: &[u8] = b"0123456789abcdef";

/// Builds a V4/R4 AES-128 encrypted single-page file. The user password is
/// `user_pw`; there is no separate owner password (the user password
/// doubles as it, the convention for "empty owner password" files).
fn encrypted_pdf(user_pw: &[u8], title: &[u8], content: &[u8]) -> Vec<u8> {
    let p: u32 = 0xFFFF_F0C0;
    let o = compute_o(user_pw, user_pw, 4, 16);
    let (u, _) = compute_u_for_password(user_pw, &o, p, FILE_ID, 4, 16, true);

    let mut stdcf = Dictionary::new();
    stdcf.set("CFM", Object::name("AESV2"));
    stdcf.set("Length", Object::Integer(16));
    let mut cf = Dictionary::new();
    cf.set("StdCF", stdcf);
    let encrypt_dict = Dictionary::from_iter(vec![
        ("Filter", Object::name("Standard")),
        ("V", Object::Integer(4)),
        ("R", Object::Integer(4)),
        ("Length", Object::Integer(128)),
        ("P", Object::Integer(p as i32 as i64)),
        ("O", Object::String(o.clone(), StringFormat::Hexadecimal)),
        ("U", Object::String(u.clone(), StringFormat::Hexadecimal)),
        ("CF", Object::Dictionary(cf)),
        ("StmF", Object::name("StdCF")),
        ("StrF", Object::name("StdCF")),
    ]);

    let handler = SecurityHandler::open(&encrypt_dict, FILE_ID, user_pw).unwrap();

    let mut pdf = TestPdf::new();
    let catalog = pdf.reserve();
    let pages = pdf.reserve();
    let page = pdf.reserve();
    let contents = pdf.reserve();
    let info = pdf.reserve();
    let encrypt = pdf.reserve();

    pdf.set(
        catalog,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Catalog")),
            ("Pages", Object::Reference(pages)),
        ])),
    );
    pdf.set(
        pages,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Pages")),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page)])),
        ])),
    );
    pdf.set(
        page,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(pages)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(contents)),
        ])),
    );
    pdf.set(
        contents,
        Object::Stream(Stream::new(
            Dictionary::new(),
            handler.encrypt_stream(contents, content),
        )),
    );
    pdf.set(
        info,
        Object::Dictionary(Dictionary::from_iter(vec![(
            "Title",
            Object::String(handler.encrypt_string(info, title), StringFormat::Hexadecimal),
        )])),
    );
    pdf.set(encrypt, Object::Dictionary(encrypt_dict));

    pdf.trailer_entry("Encrypt", Object::Reference(encrypt));
    pdf.trailer_entry("Info", Object::Reference(info));
    pdf.trailer_entry(
        "ID",
        Object::Array(vec![
            Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal),
            Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal),
        ]),
    );
    pdf.build(catalog)
}

#[test]
fn wrong_password_is_rejected() {
    let pdf = encrypted_pdf(b"abc", b"Hello", b"q Q");
    assert!(matches!(
        PdfDocument::open(pdf.clone()),
        Err(Error::BadPassword)
    ));
    assert!(matches!(
        PdfDocument::open_with_password(pdf, b"wrong"),
        Err(Error::BadPassword)
    ));
}

#[test]
fn user_password_decrypts_strings_and_streams() {
    let pdf = encrypted_pdf(b"abc", b"Hello", b"q Q");
    let doc = PdfDocument::open_with_password(pdf, b"abc").unwrap();
    assert!(doc.is_encrypted());
    assert!(doc.permissions().unwrap().can_print());

    // the Info title decrypts to its plaintext
    let info = doc.info().unwrap();
    assert_eq!(
        info.as_dict().unwrap().get(b"Title").unwrap().as_string(),
        Some(&b"Hello"[..])
    );

    // content streams decrypt before interpretation
    let page_id = doc.page_id(0).unwrap();
    assert_eq!(doc.page_content_bytes(page_id).unwrap(), b"q Q");
    let mut sink = RecordingSink::new();
    let warnings = readpdf::render_page(&doc, 0, &mut sink, &RenderOptions::default()).unwrap();
    assert_eq!(warnings, vec![]);
}

/// An empty user password authenticates automatically via `open`.
#[test]
fn empty_user_password_opens_silently() {
    let pdf = encrypted_pdf(b"", b"Open", b"");
    let doc = PdfDocument::open(pdf).unwrap();
    let info = doc.info().unwrap();
    assert_eq!(
        info.as_dict().unwrap().get(b"Title").unwrap().as_string(),
        Some(&b"Open"[..])
    );
}

/// RC4 (V2/R3) files take the same path with the stream cipher.
#[test]
fn rc4_r3_document() {
    let p: u32 = 0xFFFF_FFFC;
    let o = compute_o(b"owner", b"user", 3, 16);
    let (u, _) = compute_u_for_password(b"user", &o, p, FILE_ID, 3, 16, true);
    let encrypt_dict = Dictionary::from_iter(vec![
        ("Filter", Object::name("Standard")),
        ("V", Object::Integer(2)),
        ("R", Object::Integer(3)),
        ("Length", Object::Integer(128)),
        ("P", Object::Integer(p as i32 as i64)),
        ("O", Object::String(o, StringFormat::Hexadecimal)),
        ("U", Object::String(u, StringFormat::Hexadecimal)),
    ]);
    let handler = SecurityHandler::open(&encrypt_dict, FILE_ID, b"user").unwrap();

    let mut pdf = TestPdf::new();
    let catalog = pdf.reserve();
    let pages = pdf.reserve();
    let info = pdf.reserve();
    let encrypt = pdf.reserve();
    pdf.set(
        catalog,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Catalog")),
            ("Pages", Object::Reference(pages)),
        ])),
    );
    pdf.set(
        pages,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Pages")),
            ("Count", Object::Integer(0)),
            ("Kids", Object::Array(vec![])),
        ])),
    );
    pdf.set(
        info,
        Object::Dictionary(Dictionary::from_iter(vec![(
            "Title",
            Object::String(
                handler.encrypt_string(info, b"Stream cipher"),
                StringFormat::Hexadecimal,
            ),
        )])),
    );
    pdf.set(encrypt, Object::Dictionary(encrypt_dict));
    pdf.trailer_entry("Encrypt", Object::Reference(encrypt));
    pdf.trailer_entry("Info", Object::Reference(info));
    pdf.trailer_entry(
        "ID",
        Object::Array(vec![
            Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal),
            Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal),
        ]),
    );
    let bytes = pdf.build(catalog);

    // both the user and the owner password open the file
    let doc = PdfDocument::open_with_password(bytes.clone(), b"user").unwrap();
    let title = doc.info().unwrap();
    assert_eq!(
        title.as_dict().unwrap().get(b"Title").unwrap().as_string(),
        Some(&b"Stream cipher"[..])
    );
    assert!(PdfDocument::open_with_password(bytes, b"owner").is_ok());
}
