//! Office Open XML parts for a minimal presentation: one master, one blank
//! layout, one theme, and a text-box slide per [`Slide`].

use quick_xml::escape::escape;

use crate::slides::{Paragraph, Slide, SlideDeck};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// 10in x 7.5in, in EMU.
const SLIDE_CX: u64 = 9_144_000;
const SLIDE_CY: u64 = 6_858_000;
const EMU_PER_INCH: u64 = 914_400;

#[derive(Debug, Clone, Copy)]
struct Frame {
    x: u64,
    y: u64,
    cx: u64,
    cy: u64
}

const HEADING_FRAME: Frame = Frame {
    x: EMU_PER_INCH / 2,
    y: EMU_PER_INCH / 4,
    cx: SLIDE_CX - EMU_PER_INCH,
    cy: EMU_PER_INCH
};
const BODY_FRAME: Frame = Frame {
    x: EMU_PER_INCH,
    y: EMU_PER_INCH * 3 / 2,
    cx: EMU_PER_INCH * 8,
    cy: SLIDE_CY - EMU_PER_INCH * 2
};
const FULL_FRAME: Frame = Frame {
    x: EMU_PER_INCH / 4,
    y: EMU_PER_INCH / 4,
    cx: SLIDE_CX - EMU_PER_INCH / 2,
    cy: SLIDE_CY - EMU_PER_INCH / 2
};

/// Every part of the package as `(path inside the zip, xml)`, in write order.
pub fn package_parts(deck: &SlideDeck) -> Vec<(String, String)> {
    let count = deck.slides.len();
    let mut parts = vec![
        ("[Content_Types].xml".to_string(), content_types(count)),
        ("_rels/.rels".to_string(), root_rels()),
        ("docProps/app.xml".to_string(), app_props(count)),
        ("docProps/core.xml".to_string(), core_props()),
        ("ppt/presentation.xml".to_string(), presentation(count)),
        ("ppt/_rels/presentation.xml.rels".to_string(), presentation_rels(count)),
        ("ppt/slideMasters/slideMaster1.xml".to_string(), slide_master()),
        ("ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(), relationships(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "theme", "../theme/theme1.xml"),
        ])),
        ("ppt/slideLayouts/slideLayout1.xml".to_string(), slide_layout()),
        ("ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(), relationships(&[
            ("rId1", "slideMaster", "../slideMasters/slideMaster1.xml"),
        ])),
        ("ppt/theme/theme1.xml".to_string(), theme()),
    ];
    for (i, slide) in deck.slides.iter().enumerate() {
        let n = i + 1;
        parts.push((format!("ppt/slides/slide{}.xml", n), slide_xml(slide)));
        parts.push((
            format!("ppt/slides/_rels/slide{}.xml.rels", n),
            relationships(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")])
        ));
    }
    parts
}

fn content_types(slides: usize) -> String {
    let overrides = (1..=slides)
        .map(|n| format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            n
        ))
        .collect::<String>();
    format!(
        concat!(
            "{}\n",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
            r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
            "{}</Types>"
        ),
        XML_DECL, overrides
    )
}

fn root_rels() -> String {
    format!(
        concat!(
            "{}\n",
            r#"<Relationships xmlns="{}">"#,
            r#"<Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
            r#"<Relationship Id="rId3" Type="{}/extended-properties" Target="docProps/app.xml"/>"#,
            "</Relationships>"
        ),
        XML_DECL, REL_NS, REL_TYPE, REL_TYPE
    )
}

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let body = rels.iter()
        .map(|(id, kind, target)| format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_TYPE, kind, target
        ))
        .collect::<String>();
    format!("{}\n<Relationships xmlns=\"{}\">{}</Relationships>", XML_DECL, REL_NS, body)
}

fn app_props(slides: usize) -> String {
    format!(
        concat!(
            "{}\n",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>{} {}</Application><Slides>{}</Slides></Properties>"
        ),
        XML_DECL, env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), slides
    )
}

fn core_props() -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        concat!(
            "{}\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>Journal club publications</dc:title>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
            "</cp:coreProperties>"
        ),
        XML_DECL, now
    )
}

fn presentation(slides: usize) -> String {
    // rId1 master, rId2 theme, slides from rId3
    let ids = (0..slides)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 3))
        .collect::<String>();
    format!(
        concat!(
            "{}\n<p:presentation {}>",
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            "<p:sldIdLst>{}</p:sldIdLst>",
            r#"<p:sldSz cx="{}" cy="{}" type="screen4x3"/><p:notesSz cx="{}" cy="{}"/>"#,
            "</p:presentation>"
        ),
        XML_DECL, NS, ids, SLIDE_CX, SLIDE_CY, SLIDE_CY, SLIDE_CX
    )
}

fn presentation_rels(slides: usize) -> String {
    let mut rels = vec![
        ("rId1".to_string(), "slideMaster", "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), "theme", "theme/theme1.xml".to_string()),
    ];
    rels.extend((1..=slides).map(|n| {
        (format!("rId{}", n + 2), "slide", format!("slides/slide{}.xml", n))
    }));
    let borrowed = rels.iter()
        .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
        .collect::<Vec<_>>();
    relationships(&borrowed)
}

const EMPTY_TREE: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    "<p:grpSpPr/>"
);

fn slide_master() -> String {
    format!(
        concat!(
            "{}\n<p:sldMaster {}>",
            "<p:cSld><p:spTree>{}</p:spTree></p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
            r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        XML_DECL, NS, EMPTY_TREE
    )
}

fn slide_layout() -> String {
    format!(
        concat!(
            "{}\n",
            r#"<p:sldLayout {} type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
        ),
        XML_DECL, NS, EMPTY_TREE
    )
}

fn theme() -> String {
    let solid = |color: &str| format!("<a:solidFill><a:schemeClr val=\"{}\"/></a:solidFill>", color);
    let line = format!(r#"<a:ln w="9525">{}</a:ln>"#, solid("phClr"));
    format!(
        concat!(
            "{}\n",
            r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Journal Club">"#,
            "<a:themeElements>",
            r#"<a:clrScheme name="Office">"#,
            r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
            r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
            r#"<a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2>"#,
            r#"<a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2>"#,
            r#"<a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4>"#,
            r#"<a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6>"#,
            r#"<a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink>"#,
            "</a:clrScheme>",
            r#"<a:fontScheme name="Office">"#,
            r#"<a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
            r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
            "</a:fontScheme>",
            r#"<a:fmtScheme name="Office">"#,
            "<a:fillStyleLst>{}{}{}</a:fillStyleLst>",
            "<a:lnStyleLst>{}{}{}</a:lnStyleLst>",
            "<a:effectStyleLst>",
            "<a:effectStyle><a:effectLst/></a:effectStyle>",
            "<a:effectStyle><a:effectLst/></a:effectStyle>",
            "<a:effectStyle><a:effectLst/></a:effectStyle>",
            "</a:effectStyleLst>",
            "<a:bgFillStyleLst>{}{}{}</a:bgFillStyleLst>",
            "</a:fmtScheme>",
            "</a:themeElements></a:theme>"
        ),
        XML_DECL,
        solid("phClr"), solid("phClr"), solid("phClr"),
        line, line, line,
        solid("phClr"), solid("phClr"), solid("phClr")
    )
}

fn slide_xml(slide: &Slide) -> String {
    let mut shapes = String::new();
    let mut shape_id = 2;
    let body_frame = match &slide.heading {
        Some(heading) => {
            let paragraph = Paragraph::new(heading.as_str(), 32).bold();
            shapes.push_str(&text_box(shape_id, "Title", HEADING_FRAME, std::slice::from_ref(&paragraph)));
            shape_id += 1;
            BODY_FRAME
        },
        None => FULL_FRAME
    };
    shapes.push_str(&text_box(shape_id, "Body", body_frame, &slide.paragraphs));

    format!(
        concat!(
            "{}\n<p:sld {}>",
            "<p:cSld><p:spTree>{}{}</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        ),
        XML_DECL, NS, EMPTY_TREE, shapes
    )
}

fn text_box(id: u32, name: &str, frame: Frame, paragraphs: &[Paragraph]) -> String {
    let body = paragraphs.iter().map(paragraph_xml).collect::<String>();
    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{} {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>{}</p:txBody>"#,
            "</p:sp>"
        ),
        id, name, id, frame.x, frame.y, frame.cx, frame.cy, body
    )
}

fn paragraph_xml(paragraph: &Paragraph) -> String {
    let props = format!(
        r#"<a:rPr lang="en-US" sz="{}" b="{}" dirty="0"/>"#,
        paragraph.size_pt * 100,
        if paragraph.bold { 1 } else { 0 }
    );
    if paragraph.text.is_empty() {
        return format!("<a:p><a:endParaRPr lang=\"en-US\" sz=\"{}\" dirty=\"0\"/></a:p>", paragraph.size_pt * 100);
    }
    let line_break = format!("<a:br>{}</a:br>", props);
    let runs = paragraph.text.split('\n')
        .map(|line| format!("<a:r>{}<a:t>{}</a:t></a:r>", props, escape(line)))
        .collect::<Vec<_>>()
        .join(line_break.as_str());
    format!("<a:p>{}</a:p>", runs)
}
